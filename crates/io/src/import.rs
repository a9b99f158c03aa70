//! Persisted CSV imports.
//!
//! An upload is decoded and checked once, then stored as a plain
//! comma-separated file named by an [`ImportId`]. Later invocations reopen it
//! by id to preview or commit, and release it when done:
//!
//! ```text
//! <root>/csvimport/<type>/<user id>/<iid>
//! ```

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use commentbank_core::ActingUser;
use uuid::Uuid;

use crate::csv::{self as upload_csv, Delimiter};
use crate::error::ImportError;

/// Opaque handle of a stored upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportId(Uuid);

impl ImportId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ImportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImportId {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ImportError::UnknownHandle(s.to_string()))
    }
}

/// Sequential access to an upload's header and rows.
pub trait ImportSource {
    /// Header cells, or `None` when the stored upload cannot be read.
    fn get_columns(&self) -> Option<&[String]>;

    /// Rewind to the first data row.
    fn init(&mut self) -> Result<(), ImportError>;

    /// Next data row, `None` at the end or before `init`.
    fn next_row(&mut self) -> Result<Option<Vec<String>>, ImportError>;

    /// Stop reading. The stored upload stays available.
    fn close(&mut self);

    /// Delete the stored upload. `full` deletes every stored upload of this
    /// type for the user.
    fn cleanup(&mut self, full: bool) -> Result<(), ImportError>;
}

pub struct CsvImportReader {
    iid: ImportId,
    dir: PathBuf,
    columns: Option<Vec<String>>,
    reader: Option<csv::Reader<File>>,
}

impl CsvImportReader {
    /// A reader for a new, empty import. Call [`load_csv_content`](Self::load_csv_content) next.
    pub fn create(root: &Path, import_type: &str, user: ActingUser) -> Self {
        Self {
            iid: ImportId::new(),
            dir: user_dir(root, import_type, user),
            columns: None,
            reader: None,
        }
    }

    /// A reader for a previously stored import. A missing or unreadable
    /// file is not an error here; `get_columns` reports it as `None`.
    pub fn open(root: &Path, import_type: &str, user: ActingUser, iid: ImportId) -> Self {
        let mut reader = Self {
            iid,
            dir: user_dir(root, import_type, user),
            columns: None,
            reader: None,
        };
        reader.columns = reader.read_columns();
        reader
    }

    pub fn iid(&self) -> ImportId {
        self.iid
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(self.iid.to_string())
    }

    /// Decode, check and store an upload. Returns the number of data rows.
    ///
    /// On failure nothing is left on disk for this handle.
    pub fn load_csv_content(
        &mut self,
        content: &[u8],
        encoding: &str,
        delimiter: Delimiter,
    ) -> Result<usize, ImportError> {
        match self.store(content, encoding, delimiter) {
            Ok(count) => Ok(count),
            Err(e) => {
                self.cleanup(false)?;
                Err(e)
            }
        }
    }

    fn store(&mut self, content: &[u8], encoding: &str, delimiter: Delimiter) -> Result<usize, ImportError> {
        let text = upload_csv::decode(content, encoding)?;
        let parsed = upload_csv::parse(&text, delimiter)?;

        fs::create_dir_all(&self.dir)?;
        let mut writer = csv::WriterBuilder::new().from_path(self.path())?;
        writer.write_record(&parsed.columns)?;
        for row in &parsed.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        log::debug!(
            "stored import {} ({} columns, {} rows) at {}",
            self.iid,
            parsed.columns.len(),
            parsed.rows.len(),
            self.path().display()
        );

        self.columns = Some(parsed.columns);
        Ok(parsed.rows.len())
    }

    fn read_columns(&self) -> Option<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(self.path())
            .ok()?;
        let header = reader.records().next()?.ok()?;
        Some(header.iter().map(|h| h.to_string()).collect())
    }
}

impl ImportSource for CsvImportReader {
    fn get_columns(&self) -> Option<&[String]> {
        self.columns.as_deref()
    }

    fn init(&mut self) -> Result<(), ImportError> {
        self.close();
        let path = self.path();
        if !path.exists() {
            return Err(ImportError::UnknownHandle(self.iid.to_string()));
        }
        let reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
        self.reader = Some(reader);
        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Vec<String>>, ImportError> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut record = csv::StringRecord::new();
        if reader.read_record(&mut record)? {
            Ok(Some(record.iter().map(|field| field.to_string()).collect()))
        } else {
            Ok(None)
        }
    }

    fn close(&mut self) {
        self.reader = None;
    }

    fn cleanup(&mut self, full: bool) -> Result<(), ImportError> {
        self.close();
        if full {
            if self.dir.exists() {
                fs::remove_dir_all(&self.dir)?;
            }
        } else {
            let path = self.path();
            if path.exists() {
                fs::remove_file(&path)?;
            }
        }
        log::debug!("cleaned up import {} (full={})", self.iid, full);
        Ok(())
    }
}

fn user_dir(root: &Path, import_type: &str, user: ActingUser) -> PathBuf {
    root.join("csvimport")
        .join(import_type)
        .join(user.id.to_string())
}
