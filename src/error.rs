//! Errors surfaced by a scan.
//!
//! None of these are fatal: each one is recovered at the root or
//! sub-directory level and reported next to whatever records were found.
//! A missing standard plugin folder and an unreadable property list are
//! not errors at all.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ScanError {
    /// The user declined or revoked access to a root.
    #[error("access to {} was denied", path.display())]
    AccessDenied { path: PathBuf },

    /// Listing a plugin folder failed for a reason other than non-existence.
    #[error("failed to read {}: {source}", path.display())]
    DirectoryReadFailure {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },
}

impl ScanError {
    pub fn access_denied(path: impl Into<PathBuf>) -> Self {
        ScanError::AccessDenied { path: path.into() }
    }

    pub fn read_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScanError::DirectoryReadFailure {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
