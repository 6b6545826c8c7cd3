pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    parse_duration, AppConfig, CacheConfig, Config, DatabaseConfig, LoggerConfig, ServerConfig,
    TimeoutsConfig,
};
pub use error::{CoreError, Result};
