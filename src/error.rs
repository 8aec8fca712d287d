//! Error types for the gdrive-dl library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while listing or transferring a Drive folder.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Drive API answered with a non-success status.
    #[error("Drive API returned {status}: {body}")]
    Api {
        /// HTTP status of the response.
        status: reqwest::StatusCode,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The remote answered with something the engine cannot act on.
    #[error("Unexpected response: {0}")]
    Protocol(String),

    /// A single network call exceeded the configured timeout.
    #[error("Network call timed out after {0:?}")]
    Timeout(Duration),

    /// The remote folder could not be enumerated completely.
    #[error("Failed to list remote folder {folder_id}: {source}")]
    RemoteList {
        /// Folder being listed.
        folder_id: String,
        /// Cause of the failed page.
        #[source]
        source: Box<Error>,
    },

    /// The target directory could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A remote name cannot be used as a local file name.
    #[error("Refusing unsafe file name: {0:?}")]
    UnsafeName(String),

    /// Credentials are missing or could not be refreshed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if this error aborts the whole run rather than a single
    /// transfer attempt.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::RemoteList { .. } | Self::DirectoryCreate { .. } | Self::Auth(_) | Self::Config(_)
        )
    }
}

/// A specialized `Result` type for gdrive-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
