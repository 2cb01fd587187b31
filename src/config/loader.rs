//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::resource::ResourceError;

/// Fatal startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("error parsing {what}: {source}")]
    Json {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is missing")]
    MissingSetting(&'static str),

    #[error("{name} is invalid: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("unknown handler {0}")]
    UnknownHandler(String),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = read_file(path)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

pub fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse text that must hold a JSON object.
pub fn parse_json_object(raw: &str, what: &str) -> Result<Map<String, Value>, ConfigError> {
    serde_json::from_str::<Map<String, Value>>(raw).map_err(|source| ConfigError::Json {
        what: what.to_string(),
        source,
    })
}
