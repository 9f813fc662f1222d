use std::io;
use std::path::PathBuf;

use url::Url;

use crate::io::FetchError;

/// Errors produced while packing remote files or extracting archive entries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create staging directory '{path}': {source}")]
    Staging { path: PathBuf, source: io::Error },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: &'static str },

    #[error("failed to set up HTTP client: {0}")]
    Client(#[source] FetchError),

    #[error("failed to download '{url}' to '{filename}': {source}")]
    Download {
        url: Url,
        filename: String,
        source: FetchError,
    },

    #[error("failed to write archive '{path}': {source}")]
    ArchiveWrite {
        path: PathBuf,
        source: ArchiveWriteError,
    },

    #[error("failed to open archive '{path}': {source}")]
    ArchiveOpen {
        path: PathBuf,
        source: zip::result::ZipError,
    },

    #[error("entry '{entry}' not found in '{archive}'")]
    EntryNotFound { archive: PathBuf, entry: String },

    #[error("entry '{entry}' in '{archive}' is a directory")]
    EntryIsDirectory { archive: PathBuf, entry: String },

    #[error("failed to create temporary directory in '{path}': {source}")]
    TempDir { path: PathBuf, source: io::Error },

    #[error("failed to extract to '{path}': {source}")]
    Extract { path: PathBuf, source: io::Error },

    #[error("failed to remove temporary directory '{path}': {source}")]
    Cleanup { path: PathBuf, source: io::Error },

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Failure inside the archive writing stage.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveWriteError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, Error>;
