//! Tracing setup for hosts.

use std::fmt;
use std::io;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{UnilangError, UnilangResult};

/// Log level for the stderr subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = UnilangError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(UnilangError::Core(unilang_core::CoreError::config(format!(
                "unknown log level '{}'",
                other
            )))),
        }
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Fails if a subscriber is
/// already installed.
pub fn init_tracing(level: LogLevel) -> UnilangResult<()> {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| UnilangError::Logging {
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod log_level {
        use super::*;

        #[test]
        fn converts_to_tracing_level() {
            assert_eq!(LogLevel::Trace.to_tracing_level(), tracing::Level::TRACE);
            assert_eq!(LogLevel::Warn.to_tracing_level(), tracing::Level::WARN);
            assert_eq!(LogLevel::Error.to_tracing_level(), tracing::Level::ERROR);
        }

        #[test]
        fn parses_case_insensitively() {
            assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
            assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        }

        #[test]
        fn unknown_level_is_configuration_error() {
            let err = "loud".parse::<LogLevel>().unwrap_err();
            assert_eq!(err.error_code(), unilang_core::ErrorCode::Configuration);
            assert!(err.to_string().contains("loud"));
        }

        #[test]
        fn serde_uses_lowercase_names() {
            assert_eq!(serde_json::to_string(&LogLevel::Trace).unwrap(), "\"trace\"");
            let level: LogLevel = serde_json::from_str("\"error\"").unwrap();
            assert_eq!(level, LogLevel::Error);
        }
    }

    #[test]
    fn second_install_fails() {
        let _ = init_tracing(LogLevel::Warn);
        let err = init_tracing(LogLevel::Warn).unwrap_err();
        assert!(matches!(err, UnilangError::Logging { .. }));
    }
}
