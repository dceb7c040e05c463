//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `telegram.bot_token`.
pub const BOT_TOKEN_ENV_VAR: &str = "BOT_TOKEN";
/// Environment variable overriding `database.url`.
pub const DATABASE_URL_ENV_VAR: &str = "DATABASE_URL";
/// Environment variable overriding `admin.api_key`.
pub const ADMIN_API_KEY_ENV_VAR: &str = "ADMIN_API_KEY";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from a TOML file, apply environment overrides, validate.
///
/// A missing file is not an error: defaults plus environment are used, so a
/// container can be configured from the environment alone.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
        parse_config(&content)?
    } else {
        tracing::warn!(path = ?path, "Config file not found, using defaults");
        ServiceConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse configuration text without touching the environment.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    toml::from_str(content).map_err(ConfigError::Parse)
}

/// Overlay secrets from the environment. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(token) = get(BOT_TOKEN_ENV_VAR) {
        config.telegram.bot_token = token;
    }
    if let Some(url) = get(DATABASE_URL_ENV_VAR) {
        config.database.url = url;
    }
    if let Some(key) = get(ADMIN_API_KEY_ENV_VAR) {
        config.admin.api_key = key;
    }
}
