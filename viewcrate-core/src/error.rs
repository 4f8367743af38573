//! Error types for viewcrate

use thiserror::Error;

/// Main error type for viewcrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    #[error("Render mode {0} not supported")]
    UnsupportedRenderMode(String),

    #[error("Rasterization backend error: {0}")]
    Backend(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias for viewcrate operations
pub type Result<T> = std::result::Result<T, Error>;
