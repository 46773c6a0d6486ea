//! Domain error types.

use chrono::NaiveDateTime;

use super::order::{OrderId, OrderStatus};

/// Why a single stationarity window could not be evaluated.
///
/// Always recovered locally: the affected block keeps the sentinel value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatisticError {
    #[error("window of {observations} observations is too short for the regression")]
    TooFewObservations { observations: usize },

    #[error("window is constant")]
    DegenerateWindow,

    #[error("design matrix is singular")]
    SingularMatrix,

    #[error("statistic is not finite")]
    NonFinite,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrokerError {
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    #[error("invalid limit price {0}")]
    InvalidPrice(f64),

    #[error("computed order size {0} is not positive")]
    InvalidSize(f64),
}

/// Contract violations reported by the position/order tracker.
///
/// These never abort a run; the offending action is dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrackerError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("notification {status} for untracked order {id}")]
    UntrackedOrder { id: OrderId, status: OrderStatus },

    #[error("order {id} was already filled when cancel was requested")]
    CancelRaced { id: OrderId },

    #[error("order {id} completed without execution details")]
    MissingExecution { id: OrderId },

    #[error(transparent)]
    Broker(#[from] BrokerError),
}

/// Top-level error type for meanrev.
#[derive(Debug, thiserror::Error)]
pub enum MeanrevError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("bar {index} at {current} does not follow {previous}")]
    OutOfOrderBar {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<&MeanrevError> for std::process::ExitCode {
    fn from(err: &MeanrevError) -> Self {
        let code: u8 = match err {
            MeanrevError::Io { .. } => 1,
            MeanrevError::ConfigParse { .. } | MeanrevError::ConfigInvalid { .. } => 2,
            MeanrevError::Data { .. } => 3,
            MeanrevError::InsufficientData { .. } => 5,
            MeanrevError::OutOfOrderBar { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn out_of_order_message_names_both_timestamps() {
        let previous = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(0, 1, 0)
            .unwrap();
        let current = NaiveDate::from_ymd_opt(2018, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let err = MeanrevError::OutOfOrderBar {
            index: 7,
            previous,
            current,
        };
        let msg = err.to_string();
        assert!(msg.contains("bar 7"));
        assert!(msg.contains("2018-01-02 00:01:00"));
        assert!(msg.contains("2018-01-02 00:00:00"));
    }

    #[test]
    fn invalid_transition_message() {
        let err = TrackerError::InvalidTransition {
            action: "sell",
            state: "flat",
        };
        assert_eq!(err.to_string(), "cannot sell while flat");
    }

    #[test]
    fn broker_error_converts_into_tracker_error() {
        let err: TrackerError = BrokerError::InvalidPrice(-1.0).into();
        assert!(matches!(err, TrackerError::Broker(BrokerError::InvalidPrice(_))));
    }

    fn exit_code_of(err: &MeanrevError) -> String {
        format!("{:?}", std::process::ExitCode::from(err))
    }

    #[test]
    fn config_errors_share_exit_code() {
        let parse = MeanrevError::ConfigParse {
            file: "run.ini".into(),
            reason: "bad section".into(),
        };
        let invalid = MeanrevError::ConfigInvalid {
            section: "strategy".into(),
            key: "period".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(exit_code_of(&parse), exit_code_of(&invalid));
        assert_eq!(exit_code_of(&parse), format!("{:?}", std::process::ExitCode::from(2)));
    }

    #[test]
    fn io_error_names_path_and_exits_with_one() {
        let err = MeanrevError::Io {
            path: "feed.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.to_string(), "failed to read feed.csv: gone");
        assert_eq!(exit_code_of(&err), format!("{:?}", std::process::ExitCode::from(1)));
    }
}
