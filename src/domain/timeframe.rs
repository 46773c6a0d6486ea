//! Bar timeframe and its annualization factor.

use std::fmt;
use std::str::FromStr;

/// Each bar counts as one period of this timeframe.
///
/// Parses from a name or from the numeric codes 4 (minutes) to 8 (years)
/// used by older command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timeframe {
    #[default]
    Minutes,
    Days,
    Weeks,
    Months,
    Years,
}

impl Timeframe {
    pub const NAMES: [&'static str; 5] = ["minutes", "days", "weeks", "months", "years"];

    pub fn periods_per_year(self) -> f64 {
        match self {
            Timeframe::Minutes => 525_600.0,
            Timeframe::Days => 365.0,
            Timeframe::Weeks => 52.0,
            Timeframe::Months => 12.0,
            Timeframe::Years => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Timeframe::Minutes => "minutes",
            Timeframe::Days => "days",
            Timeframe::Weeks => "weeks",
            Timeframe::Months => "months",
            Timeframe::Years => "years",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" | "minute" | "4" => Ok(Timeframe::Minutes),
            "days" | "day" | "5" => Ok(Timeframe::Days),
            "weeks" | "week" | "6" => Ok(Timeframe::Weeks),
            "months" | "month" | "7" => Ok(Timeframe::Months),
            "years" | "year" | "8" => Ok(Timeframe::Years),
            other => Err(format!(
                "unknown timeframe '{}', expected one of {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}
