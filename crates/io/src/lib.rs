// File I/O operations

pub mod csv;
pub mod error;
pub mod import;
pub mod store;

pub use error::{ImportError, StoreError};
pub use import::{CsvImportReader, ImportId, ImportSource};
pub use store::{RecordStore, SqliteStore};
