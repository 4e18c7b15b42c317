//! # Query Lab Configuration
//!
//! Loads the strongly-typed [`Config`] from layered sources and sets up the
//! tracing subscriber.
//!
//! Sources, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the TOML file passed to [`load_config`] (optional)
//! 3. `QUERY_LAB__SECTION__KEY` environment variables
//! 4. `DATABASE_URL`, which always wins for `database.url`

use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{Config, DatabaseSettings, DemoSettings, LogFormat, LoggingSettings};

/// Environment prefix for overrides, e.g. `QUERY_LAB__DEMO__PAGE_SIZE=25`.
pub const ENV_PREFIX: &str = "QUERY_LAB";

/// Loads the application configuration.
///
/// A missing file is not an error; the defaults plus the environment are
/// enough to run against a local database.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .set_default("database.url", "")?
        .set_default("database.max_connections", 5)?
        .set_default("database.acquire_timeout_secs", 5)?
        .set_default("database.run_migrations", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "full")?
        .set_default("logging.file_prefix", "query-lab.log")?
        .set_default("demo.page_size", 50)?
        .set_default("demo.page_offset", 50)?
        .set_default("demo.sample_size", 15)?
        .set_default("demo.time_zone", "America/Chicago")?
        .set_default("demo.store_name_filter", "Riders Company")?
        .set_default("demo.over_inclusion_person_id", 1)?
        .set_default("demo.first_name_update", "John")?
        .set_default("demo.second_first_name_update", "Ken")?
        .set_default("demo.bulk_shift_days", 5)?
        .set_default("demo.bulk_threshold_years", 4)?
        .set_default("demo.aggregation_separator", ", ")?
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.database.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.url must be set (or provide DATABASE_URL)".to_string(),
        ));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }
    if config.demo.page_size <= 0 {
        return Err(ConfigError::ValidationError(
            "demo.page_size must be greater than zero".to_string(),
        ));
    }
    if config.demo.page_offset < 0 {
        return Err(ConfigError::ValidationError(
            "demo.page_offset cannot be negative".to_string(),
        ));
    }
    if config.demo.sample_size <= 0 {
        return Err(ConfigError::ValidationError(
            "demo.sample_size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}
