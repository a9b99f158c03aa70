use std::fmt;

use commentbank_io::{ImportError, StoreError};

#[derive(Debug)]
pub enum UploadError {
    /// The upload could not be decoded, checked or stored.
    Import(ImportError),
    /// The stored upload has no readable header.
    CannotReadTmpFile,
    /// Header has fewer columns than the minimum.
    FewColumns { found: usize, min: usize },
    /// Record store failure. Not retried.
    Store(StoreError),
    /// Tracker used after `close`.
    TrackerClosed,
    /// Writing rendered output failed.
    Output(String),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import(e) => write!(f, "{e}"),
            Self::CannotReadTmpFile => write!(f, "cannot read temporary file"),
            Self::FewColumns { found, min } => {
                write!(f, "not enough columns, please verify the delimiter setting (found {found}, need at least {min})")
            }
            Self::Store(e) => write!(f, "{e}"),
            Self::TrackerClosed => write!(f, "progress tracker already closed"),
            Self::Output(msg) => write!(f, "output error: {msg}"),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Import(e) => Some(e),
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ImportError> for UploadError {
    fn from(e: ImportError) -> Self {
        Self::Import(e)
    }
}

impl From<StoreError> for UploadError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<std::io::Error> for UploadError {
    fn from(e: std::io::Error) -> Self {
        Self::Output(e.to_string())
    }
}
