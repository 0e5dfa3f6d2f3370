//! Errors of the action log and rules file
//!
//! Classification itself never fails; only the I/O around it does.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while persisting actions or loading rules
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to lock action log {path}: {errno}")]
    Lock {
        path: PathBuf,
        errno: nix::errno::Errno,
    },

    #[error("Action log {path} is not a JSON array of entries: {source}")]
    CorruptLog {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid rules TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid rules: {0}")]
    InvalidRules(String),
}

/// Result type for action log and rules operations
pub type Result<T> = std::result::Result<T, Error>;
