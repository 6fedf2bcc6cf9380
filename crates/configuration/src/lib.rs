use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{Config, DatabaseConfig, LoggingConfig, OutputConfig, OutputFormat};

/// Prefix of environment variables that override file settings,
/// e.g. `GRADEBOOK__DATABASE__MAX_CONNECTIONS=10`.
pub const ENV_PREFIX: &str = "GRADEBOOK";

/// Loads the application configuration.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file at `path`
/// (optional), `GRADEBOOK__*` environment variables, and finally `DATABASE_URL`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from(path).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

    let mut config = deserialize(builder)?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = Some(url);
    }
    config.validate()?;

    Ok(config)
}

/// Parses a configuration from TOML text alone, without consulting the environment.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
    let config = deserialize(builder)?;
    config.validate()?;
    Ok(config)
}

fn deserialize(builder: ConfigBuilder<DefaultState>) -> Result<Config, ConfigError> {
    let config = builder.build()?.try_deserialize::<Config>()?;
    Ok(config)
}

impl Config {
    /// Rejects settings that would make every report fail later on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if let Some(url) = &self.database.url {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "database.url must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout(), Duration::from_secs(5));
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.directory.is_none());
        assert_eq!(config.output.format, OutputFormat::Table);
    }

    #[test]
    fn sections_override_defaults() {
        let config = parse_config(
            r#"
            [database]
            url = "postgres://localhost/gradebook"
            max_connections = 2

            [logging]
            level = "database=debug"
            directory = "logs"

            [output]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/gradebook"));
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.database.acquire_timeout_secs, 5);
        assert_eq!(config.logging.level, "database=debug");
        assert_eq!(config.logging.directory.as_deref(), Some(Path::new("logs")));
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn zero_connections_is_rejected() {
        let err = parse_config("[database]\nmax_connections = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn blank_url_is_rejected() {
        let err = parse_config("[database]\nurl = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_format_fails_to_load() {
        let err = parse_config("[output]\nformat = \"xml\"").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
