//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract. Scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | upload           | Loading and validating uploaded files    |
//! | 10-19   | store            | Record store (SQLite)                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `upload_exit_code` or the relevant command

use commentbank_io::ImportError;
use commentbank_upload::UploadError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options, unreadable input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Upload (3-9)
// =============================================================================

/// The file could not be decoded or parsed as CSV
/// (empty, bad encoding, duplicate field names, ragged rows).
pub const EXIT_UPLOAD_LOAD: u8 = 3;

/// Header rejected: unreadable, or fewer than three columns.
pub const EXIT_UPLOAD_COLUMNS: u8 = 4;

/// No stored upload for the given import id.
pub const EXIT_UPLOAD_UNKNOWN_HANDLE: u8 = 5;

// =============================================================================
// Store (10-19)
// =============================================================================

/// Database could not be opened, queried or written.
pub const EXIT_STORE: u8 = 10;

/// Map an UploadError to its exit code.
pub fn upload_exit_code(err: &UploadError) -> u8 {
    match err {
        UploadError::Import(ImportError::UnknownHandle(_)) => EXIT_UPLOAD_UNKNOWN_HANDLE,
        UploadError::Import(ImportError::UnknownEncoding(_))
        | UploadError::Import(ImportError::UnknownDelimiter(_)) => EXIT_USAGE,
        UploadError::Import(_) => EXIT_UPLOAD_LOAD,
        UploadError::CannotReadTmpFile | UploadError::FewColumns { .. } => EXIT_UPLOAD_COLUMNS,
        UploadError::Store(_) => EXIT_STORE,
        UploadError::TrackerClosed | UploadError::Output(_) => EXIT_ERROR,
    }
}
