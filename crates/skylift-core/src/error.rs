//! Error types for Skylift configuration

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ConfigError
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration-related errors
///
/// Everything here is detected before any store is contacted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required fields missing, all of them at once
    #[error("Missing required configuration: {}", describe_fields(.0))]
    MissingFields(Vec<String>),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Fields belonging to another API version were supplied
    #[error("Fields not allowed with {variant}: {}", describe_fields(.fields))]
    ConflictingFields { variant: String, fields: Vec<String> },

    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed env file
    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Environment variable carrying a dotted config key, e.g. `chrome.client_id` -> `CHROME_CLIENT_ID`
pub fn env_var_name(field: &str) -> String {
    field.replace('.', "_").to_uppercase()
}

fn describe_fields(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f, env_var_name(f)))
        .collect::<Vec<_>>()
        .join(", ")
}
