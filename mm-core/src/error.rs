/// Structured error types for mm-core.
///
/// Library crates return these; the `mm` binary wraps them with `anyhow`.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for configuration and logging setup
#[derive(Error, Debug)]
pub enum CoreError {
    /// No config path was given
    #[error("config path is empty")]
    EmptyConfigPath,

    /// Config file could not be read
    #[error("cannot read config from {path:?}: {source}")]
    ReadConfig { path: PathBuf, source: io::Error },

    /// Config file is not valid YAML for the settings shape
    #[error("cannot parse config from {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A duration string could not be parsed
    #[error("invalid duration '{value}' for {field}: {reason}")]
    InvalidDuration {
        field: String,
        value: String,
        reason: String,
    },

    /// Log output file could not be opened
    #[error("cannot open log output {path:?}: {source}")]
    LogOutput { path: PathBuf, source: io::Error },

    /// Global subscriber was already installed
    #[error("logging already initialized: {reason}")]
    LoggingInit { reason: String },
}

/// Result type alias for mm-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create an invalid duration error
    pub fn invalid_duration(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDuration {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::invalid_duration("timeouts.shutdownGracePeriod", "15x", "unknown unit 'x'");
        assert_eq!(
            err.to_string(),
            "invalid duration '15x' for timeouts.shutdownGracePeriod: unknown unit 'x'"
        );

        let err = CoreError::ReadConfig {
            path: PathBuf::from("/tmp/missing.yaml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("/tmp/missing.yaml"));
    }
}
