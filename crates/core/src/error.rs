//! Core error types

use thiserror::Error;

/// Errors produced by core types and speech backends
#[derive(Error, Debug)]
pub enum Error {
    /// Local speech generation failed
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The story file could not be parsed into a script
    #[error("invalid story file: {0}")]
    Script(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
