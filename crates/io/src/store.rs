// Record store backed by SQLite

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};

use commentbank_core::CommentRecord;

use crate::error::StoreError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS local_commentbank (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    commenttext TEXT NOT NULL,
    contextlevel INTEGER,          -- 10=system, 40=category, 50=course, 70=assignment
    instanceid INTEGER,            -- table depends on contextlevel
    authoredby INTEGER NOT NULL,
    timecreated INTEGER NOT NULL,  -- unix seconds
    timemodified INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS course_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course (
    id INTEGER PRIMARY KEY,
    shortname TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assign (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
"#;

/// Persistence used by the upload pipeline.
pub trait RecordStore {
    /// Insert a comment, returning its generated id.
    fn insert_comment(&self, record: &CommentRecord) -> Result<i64, StoreError>;

    /// Value of `field` in the `table` row with the given id. `None` when there
    /// is no such row or the value is empty; that is an expected outcome.
    fn get_field(&self, table: &str, field: &str, id: &str) -> Result<Option<String>, StoreError>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Create missing tables. Safe to run on an existing database.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn count_comments(&self) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM local_commentbank", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

impl RecordStore for SqliteStore {
    fn insert_comment(&self, record: &CommentRecord) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO local_commentbank (commenttext, contextlevel, instanceid, authoredby, timecreated, timemodified) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.commenttext,
                record.contextlevel.as_deref(),
                record.instanceid.as_deref(),
                record.authoredby,
                record.timecreated,
                record.timemodified,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_field(&self, table: &str, field: &str, id: &str) -> Result<Option<String>, StoreError> {
        check_identifier(table)?;
        check_identifier(field)?;

        // Identifiers cannot be bound, hence the format!
        let sql = format!("SELECT {field} FROM {table} WHERE id = ?1");
        let value: Option<Option<String>> = self
            .conn
            .query_row(&sql, params![id.trim()], |row| row.get(0))
            .optional()?;

        Ok(value.flatten().filter(|v| !v.is_empty()))
    }
}

fn check_identifier(name: &str) -> Result<(), StoreError> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let re = IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"));
    if re.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::BadIdentifier(name.to_string()))
    }
}
