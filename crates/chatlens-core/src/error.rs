//! Error types for Chatlens.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    #[error("Selector error: {0}")]
    Selector(String),

    #[error("Document error: {0}")]
    Document(String),

    #[error("Scan error: {0}")]
    Scan(String),

    #[error("Scanner stopped")]
    Stopped,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
