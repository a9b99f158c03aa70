use std::fmt;

#[derive(Debug)]
pub enum ImportError {
    /// The upload contained no header row.
    EmptyFile,
    /// Encoding label not known to encoding_rs.
    UnknownEncoding(String),
    /// Bytes could not be decoded with the requested encoding.
    Decode { encoding: String },
    /// Delimiter name not in the supported list.
    UnknownDelimiter(String),
    /// Two header cells with the same text.
    DuplicateField(String),
    /// A data row whose field count differs from the header.
    WeirdColumns { line: usize, expected: usize, found: usize },
    /// No stored upload for this handle.
    UnknownHandle(String),
    /// CSV tokenizer error.
    Csv(String),
    /// IO error (temp file read/write, etc.).
    Io(String),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFile => write!(f, "CSV file is empty"),
            Self::UnknownEncoding(label) => write!(f, "unknown encoding: {label}"),
            Self::Decode { encoding } => write!(f, "file is not valid {encoding}"),
            Self::UnknownDelimiter(name) => {
                write!(f, "unknown delimiter: {name} (expected comma, semicolon, colon, tab or auto)")
            }
            Self::DuplicateField(name) => write!(f, "duplicate field name \"{name}\""),
            Self::WeirdColumns { line, expected, found } => write!(
                f,
                "line {line}: expected {expected} column(s), found {found}"
            ),
            Self::UnknownHandle(iid) => write!(f, "cannot read temporary file for import {iid}"),
            Self::Csv(msg) => write!(f, "CSV parse error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<::csv::Error> for ImportError {
    fn from(e: ::csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// Table or field name that is not a plain identifier.
    BadIdentifier(String),
    /// SQLite error.
    Sqlite(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadIdentifier(name) => write!(f, "invalid table or field name: {name}"),
            Self::Sqlite(msg) => write!(f, "database error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}
