//! Error type shared by the library and the binaries.

use thiserror::Error;

/// Error type for histsearch operations
#[derive(Debug, Error)]
pub enum HistSearchError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Invalid config: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<toml::de::Error> for HistSearchError {
    fn from(e: toml::de::Error) -> Self {
        HistSearchError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HistSearchError>;
