//! Error types for the core crate.
//!
//! Nothing on the per-frame path fails; these cover startup (configuration)
//! and decoding of incoming gesture messages.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed gesture message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty gesture message")]
    Empty,
}
