//! Error types for content loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering and reading content files
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content directory not found: {0}")]
    ContentDirMissing(PathBuf),

    #[error("Failed to walk content directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
