//! INI-backed run configuration.
//!
//! Only the `[strategy]` and `[backtest]` sections carry settings. Section and
//! key names are case-insensitive and values are trimmed before they are
//! parsed. Any other section is reported at `warn` and otherwise ignored, so a
//! misspelt `[stratgey]` shows up in the log instead of silently running on
//! defaults.

use crate::domain::error::MeanrevError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

pub const KNOWN_SECTIONS: [&str; 2] = ["strategy", "backtest"];

#[derive(Debug)]
pub struct FileConfigAdapter {
    origin: String,
    ini: Ini,
}

impl FileConfigAdapter {
    /// A configuration with no sections; every lookup falls back to its default.
    pub fn empty() -> Self {
        Self {
            origin: "<defaults>".to_string(),
            ini: Ini::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MeanrevError> {
        let origin = path.as_ref().display().to_string();
        let mut ini = Ini::new();
        match ini.load(path.as_ref()) {
            Ok(_) => Ok(Self::loaded(origin, ini)),
            Err(reason) => Err(MeanrevError::ConfigParse {
                file: origin,
                reason,
            }),
        }
    }

    pub fn from_string(content: &str) -> Result<Self, MeanrevError> {
        let origin = "<inline>".to_string();
        let mut ini = Ini::new();
        match ini.read(content.to_string()) {
            Ok(_) => Ok(Self::loaded(origin, ini)),
            Err(reason) => Err(MeanrevError::ConfigParse {
                file: origin,
                reason,
            }),
        }
    }

    fn loaded(origin: String, ini: Ini) -> Self {
        let adapter = Self { origin, ini };
        for section in adapter.unknown_sections() {
            warn!(config = %adapter.origin, section = %section, "ignoring unknown config section");
        }
        adapter
    }

    /// Where the settings came from: a file path, `<inline>` or `<defaults>`.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Sections other than `[strategy]` and `[backtest]`, lowercased and sorted.
    pub fn unknown_sections(&self) -> Vec<String> {
        let mut unknown: Vec<String> = self
            .ini
            .sections()
            .into_iter()
            .filter(|s| !KNOWN_SECTIONS.contains(&s.as_str()))
            .collect();
        unknown.sort();
        unknown
    }

    fn lookup<T: FromStr>(&self, section: &str, key: &str) -> Option<T> {
        self.get_string(section, key)?.parse().ok()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.ini
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.lookup(section, key).unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.lookup(section, key).unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .and_then(|v| parse_flag(&v))
            .unwrap_or(default)
    }
}
