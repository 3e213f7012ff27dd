use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort an analysis run.
///
/// Malformed transcript lines and unmatched tool results are not errors;
/// they are reported through [`crate::DecodeStats`] and `Option` lookups.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
