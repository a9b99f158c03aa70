//! `commentbank-upload`: bulk comment upload pipeline.
//!
//! Validates the header of a stored CSV import, previews a sample of rows with
//! their context resolved against the record store, or commits every row as a
//! comment while streaming a results table.
//! No CLI dependencies; output goes to any `std::io::Write`.

pub mod columns;
pub mod committer;
pub mod error;
pub mod html;
pub mod preview;
pub mod resolver;
pub mod strings;
pub mod tracker;
pub mod upload;

pub use error::UploadError;
pub use preview::{Preview, PreviewRow};
pub use tracker::{ProgressTracker, Severity};
pub use upload::{CommitSummary, UploadOptions, Uploader, ValidatedUpload};

/// Import type under which uploads are stored.
pub const IMPORT_TYPE: &str = "uploadcomments";
