//! Error types for route_preview

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for load jobs
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("No plugins capable of loading routefile {} were found.", .path.display())]
    NoCapableParser { path: PathBuf },

    /// The parser's own error, message unchanged
    #[error(transparent)]
    ParserFailure(anyhow::Error),

    #[error(transparent)]
    Codec(#[from] crate::codec::CodecError),

    #[error("The file {} could not be found.", .path.display())]
    MissingFile { path: PathBuf },

    #[error("No package reader is registered to open {}", .path.display())]
    NoPackageReader { path: PathBuf },

    #[error("Worker panicked while processing {}: {message}", .path.display())]
    WorkerPanicked { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias for load operations
pub type Result<T> = std::result::Result<T, AssetError>;
