//! Error types for cmigrate

use thiserror::Error;

/// cmigrate error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),
}

/// Result type alias for cmigrate
pub type Result<T> = std::result::Result<T, Error>;
