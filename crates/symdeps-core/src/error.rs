//! Error types for verification

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SymdepsError>;

#[derive(Error, Debug)]
pub enum SymdepsError {
    #[error("{kind} {item} has a circular dependency on itself: {}", .path.join(" -> "))]
    CircularDependency {
        kind: String,
        item: String,
        path: Vec<String>,
    },

    #[error("Unknown item '{0}'")]
    UnknownItem(String),

    #[error("Invalid dependency declaration: {0}")]
    InvalidSpec(String),

    #[error("nm executable not found. Please install binutils or pass --nm")]
    NmNotFound,

    #[error("Symbol extraction failed for {file}: {message}")]
    Extraction { file: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
