//! Tracing setup driven by the `logger` config section
//!
//! Usage:
//!   logger.level: debug|info|warn|error   # default filter (unknown -> info)
//!   logger.encoding: console|json         # compact human output or JSON lines
//!   logger.outputPath: /var/log/mm.log    # append to file instead of stdout
//!   RUST_LOG=mm_store=debug               # takes precedence over logger.level

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::LoggerConfig;
use crate::error::{CoreError, Result};

/// Output format selected by `logger.encoding`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Console,
    Json,
}

impl Encoding {
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("console") {
            Self::Console
        } else {
            Self::Json
        }
    }
}

/// Map a config level name to a filter directive.
pub fn level_directive(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn build_filter(config: &LoggerConfig, force_debug: bool) -> EnvFilter {
    let fallback = if force_debug {
        "debug"
    } else {
        level_directive(&config.level)
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Install the global subscriber.
///
/// `force_debug` lowers the default filter to debug (the `--debug` flag);
/// `RUST_LOG` still wins when set. Fails if a subscriber is already installed.
pub fn init(config: &LoggerConfig, force_debug: bool) -> Result<()> {
    let filter = build_filter(config, force_debug);
    let encoding = Encoding::from_config(&config.encoding);

    if config.output_path.is_empty() {
        return match encoding {
            Encoding::Console => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(force_debug)
                .compact()
                .try_init(),
            Encoding::Json => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .try_init(),
        }
        .map_err(|err| CoreError::LoggingInit {
            reason: err.to_string(),
        });
    }

    let path = PathBuf::from(&config.output_path);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| CoreError::LogOutput { path, source })?;
    let writer = Arc::new(file);

    match encoding {
        Encoding::Console => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .compact()
            .try_init(),
        Encoding::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .json()
            .try_init(),
    }
    .map_err(|err| CoreError::LoggingInit {
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_directives() {
        assert_eq!(level_directive("debug"), "debug");
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive("warn"), "warn");
        assert_eq!(level_directive("error"), "error");
        assert_eq!(level_directive("verbose"), "info");
    }

    #[test]
    fn encoding_defaults_to_json() {
        assert_eq!(Encoding::from_config("console"), Encoding::Console);
        assert_eq!(Encoding::from_config("json"), Encoding::Json);
        assert_eq!(Encoding::from_config(""), Encoding::Json);
    }

    #[test]
    fn unwritable_output_path_is_an_error() {
        let config = LoggerConfig {
            output_path: "/nonexistent-dir/for/mm/test.log".to_string(),
            ..LoggerConfig::default()
        };
        assert!(matches!(
            init(&config, false),
            Err(CoreError::LogOutput { .. })
        ));
    }

    // The only test that installs the global subscriber.
    #[test]
    fn json_events_are_appended_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mm.log");
        let config = LoggerConfig {
            encoding: "json".to_string(),
            output_path: path.display().to_string(),
            ..LoggerConfig::default()
        };

        init(&config, false).unwrap();
        tracing::error!(user_id = 42, "failed to create user");

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("failed to create user"));
        assert!(written.contains("\"user_id\":42"));
        assert!(matches!(init(&config, false), Err(CoreError::LoggingInit { .. })));
    }
}
