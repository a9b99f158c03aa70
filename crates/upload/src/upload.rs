// Upload workflow: store, validate, then preview, commit or discard

use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use commentbank_core::fields::REQUIRED_FIELDS;
use commentbank_core::ActingUser;
use commentbank_io::csv::Delimiter;
use commentbank_io::{CsvImportReader, ImportError, ImportId, ImportSource, RecordStore};

use crate::columns::validate_upload_columns;
use crate::committer::commit_row;
use crate::error::UploadError;
use crate::preview::{build_preview, Preview};
use crate::strings;
use crate::tracker::ProgressTracker;
use crate::IMPORT_TYPE;

/// How an incoming file is decoded and how much of it is previewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Encoding label, or `auto`
    pub encoding: String,
    pub delimiter: Delimiter,
    pub preview_rows: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            delimiter: Delimiter::Comma,
            preview_rows: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub uploaded: usize,
}

/// Entry point for one user's uploads under a temporary storage root.
#[derive(Debug, Clone)]
pub struct Uploader {
    temp_root: PathBuf,
    user: ActingUser,
}

impl Uploader {
    pub fn new(temp_root: impl Into<PathBuf>, user: ActingUser) -> Self {
        Self { temp_root: temp_root.into(), user }
    }

    /// Store a freshly uploaded file under a new handle and check its header.
    pub fn ingest(&self, content: &[u8], options: &UploadOptions) -> Result<ValidatedUpload, UploadError> {
        let mut reader = CsvImportReader::create(&self.temp_root, IMPORT_TYPE, self.user);
        let rows = reader.load_csv_content(content, &options.encoding, options.delimiter)?;
        log::info!("stored upload {} with {} data rows", reader.iid(), rows);
        ValidatedUpload::new(reader, self.user)
    }

    /// Reopen an upload stored by an earlier [`ingest`](Self::ingest).
    pub fn resume(&self, iid: ImportId) -> Result<ValidatedUpload, UploadError> {
        let reader = CsvImportReader::open(&self.temp_root, IMPORT_TYPE, self.user, iid);
        if !reader.path().exists() {
            return Err(ImportError::UnknownHandle(iid.to_string()).into());
        }
        ValidatedUpload::new(reader, self.user)
    }

    /// Remove everything this user has stored, whether or not `iid` still
    /// exists or would validate.
    pub fn discard(&self, iid: ImportId) -> Result<(), UploadError> {
        let mut reader = CsvImportReader::open(&self.temp_root, IMPORT_TYPE, self.user, iid);
        reader.cleanup(true)?;
        Ok(())
    }
}

/// A stored upload whose header passed validation.
pub struct ValidatedUpload<S: ImportSource = CsvImportReader> {
    source: S,
    columns: Vec<String>,
    user: ActingUser,
}

impl ValidatedUpload<CsvImportReader> {
    pub fn iid(&self) -> ImportId {
        self.source.iid()
    }
}

impl<S: ImportSource> ValidatedUpload<S> {
    /// Validate the header of `source`. A rejected source has already been
    /// cleaned up when this returns.
    pub fn new(mut source: S, user: ActingUser) -> Result<Self, UploadError> {
        let columns = validate_upload_columns(&mut source, &REQUIRED_FIELDS)?;
        Ok(Self { source, columns, user })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sample the first `rows` lines. The stored upload is kept.
    pub fn preview<R: RecordStore + ?Sized>(&mut self, store: &R, rows: usize) -> Result<Preview, UploadError> {
        build_preview(&mut self.source, store, &self.columns, rows)
    }

    /// Insert every row as a comment, writing the results table to `out`.
    ///
    /// Rows are not validated here. The stored upload is removed once all
    /// rows are in; a store failure stops the pass and leaves it in place.
    pub fn commit<R, W>(mut self, store: &R, out: &mut W) -> Result<CommitSummary, UploadError>
    where
        R: RecordStore + ?Sized,
        W: Write,
    {
        self.source.init()?;
        let mut tracker = ProgressTracker::new(out);
        tracker.start()?;

        let mut linenum = 1; // Column header is first line.
        let mut uploaded = 0;
        while let Some(line) = self.source.next_row()? {
            tracker.flush()?;
            linenum += 1;

            tracker.track("line", &linenum.to_string())?;
            tracker.track("status", strings::ADDED)?;
            let now = chrono::Utc::now().timestamp();
            commit_row(store, &mut tracker, &self.columns, &line, self.user, now)?;
            uploaded += 1;
        }
        tracker.close()?;
        self.source.close();

        log::info!("{}: {}", strings::COMMENTS_ADDED, uploaded);
        self.source.cleanup(false)?;

        Ok(CommitSummary { uploaded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::tests::MemorySource;
    use crate::resolver::tests::FakeStore;
    use proptest::prelude::*;
    use tempfile::tempdir;

    const CONTENT: &[u8] = b"ID,Comment,ContextLevel,ContextId\n\
        1,Well done,10,\n\
        2,<p>Check your units</p>,50,7\n\
        3,Nice lab,999,1\n";

    fn uploader(root: &std::path::Path) -> Uploader {
        Uploader::new(root, ActingUser::new(2))
    }

    #[test]
    fn test_ingest_normalises_columns() {
        let dir = tempdir().unwrap();
        let upload = uploader(dir.path()).ingest(CONTENT, &UploadOptions::default()).unwrap();
        assert_eq!(upload.columns(), &["id", "comment", "contextlevel", "contextid"]);
        assert!(upload.source().path().exists());
    }

    #[test]
    fn test_commit_inserts_every_row_and_removes_upload() {
        let dir = tempdir().unwrap();
        let upload = uploader(dir.path()).ingest(CONTENT, &UploadOptions::default()).unwrap();
        let path = upload.source().path();
        let store = FakeStore::default();

        let mut out = Vec::new();
        let summary = upload.commit(&store, &mut out).unwrap();

        assert_eq!(summary.uploaded, 3);
        let inserted = store.inserted.borrow();
        assert_eq!(inserted.len(), 3);
        assert_eq!(inserted[1].commenttext, "Check your units");
        assert_eq!(inserted[2].contextlevel.as_deref(), Some("999"));
        assert!(inserted.iter().all(|r| r.authoredby == 2));
        assert!(!path.exists());

        let html = String::from_utf8(out).unwrap();
        assert_eq!(html.matches("<tr class=\"r1\">").count(), 3);
        assert_eq!(html.matches("<span class=\"ucnormal\">Added</span>").count(), 3);
        assert!(html.contains("<span class=\"ucnormal\">4</span>"));
        assert!(html.ends_with("</table>\n"));
    }

    #[test]
    fn test_preview_keeps_upload_for_resume() {
        let dir = tempdir().unwrap();
        let up = uploader(dir.path());
        let mut upload = up.ingest(CONTENT, &UploadOptions::default()).unwrap();
        let iid = upload.iid();

        let store = FakeStore::default().with("course", "7", "PHY101");
        let preview = upload.preview(&store, 2).unwrap();
        assert_eq!(preview.data_rows().count(), 2);
        assert!(preview.is_truncated());
        assert!(store.inserted.borrow().is_empty());

        let resumed = up.resume(iid).unwrap();
        let summary = resumed.commit(&store, &mut Vec::new()).unwrap();
        assert_eq!(summary.uploaded, 3);
    }

    #[test]
    fn test_resume_unknown_handle() {
        let dir = tempdir().unwrap();
        let result = uploader(dir.path()).resume(ImportId::new());
        assert!(matches!(result, Err(UploadError::Import(ImportError::UnknownHandle(_)))));
    }

    #[test]
    fn test_too_few_columns_discards_upload() {
        let dir = tempdir().unwrap();
        let options = UploadOptions {
            delimiter: Delimiter::Semicolon,
            ..Default::default()
        };
        // Comma-separated file read with a semicolon delimiter: one column
        let result = uploader(dir.path()).ingest(CONTENT, &options);
        assert!(matches!(result, Err(UploadError::FewColumns { found: 1, min: 3 })));

        let user_dir = dir.path().join("csvimport").join(IMPORT_TYPE).join("2");
        let left = std::fs::read_dir(&user_dir).map(|d| d.count()).unwrap_or(0);
        assert_eq!(left, 0);
    }

    #[test]
    fn test_discard_removes_all_user_uploads() {
        let dir = tempdir().unwrap();
        let up = uploader(dir.path());
        let first = up.ingest(CONTENT, &UploadOptions::default()).unwrap();
        let second = up.ingest(CONTENT, &UploadOptions::default()).unwrap();
        let first_path = first.source().path();

        up.discard(second.iid()).unwrap();
        assert!(!first_path.exists());
        assert!(matches!(up.resume(second.iid()), Err(UploadError::Import(ImportError::UnknownHandle(_)))));
    }

    #[test]
    fn test_discard_unknown_handle_is_not_an_error() {
        let dir = tempdir().unwrap();
        let up = uploader(dir.path());
        let stored = up.ingest(CONTENT, &UploadOptions::default()).unwrap();
        let path = stored.source().path();

        up.discard(ImportId::new()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_commit_on_memory_source_stamps_author() {
        let source = MemorySource::new(
            &["comment", "contextlevel", "contextid"],
            &[&["a", "10", ""], &["b", "50", "1"]],
        );
        let upload = ValidatedUpload::new(source, ActingUser::new(5)).unwrap();
        let store = FakeStore::default();

        let summary = upload.commit(&store, &mut Vec::new()).unwrap();
        assert_eq!(summary.uploaded, 2);
        assert_eq!(store.inserted.borrow()[1].authoredby, 5);
    }

    #[test]
    fn test_repeated_column_last_one_wins_in_both_passes() {
        let source = MemorySource::new(&["Comment", "comment", "contextlevel"], &[&["hello", "", "10"]]);
        let mut upload = ValidatedUpload::new(source, ActingUser::new(2)).unwrap();
        assert_eq!(upload.columns(), &["comment", "comment", "contextlevel"]);
        let store = FakeStore::default();

        let preview = upload.preview(&store, 10).unwrap();
        let (_, _, status) = preview.data_rows().next().unwrap();
        assert_eq!(status, &vec![strings::MISSING_COMMENT.to_string()]);

        upload.commit(&store, &mut Vec::new()).unwrap();
        assert_eq!(store.inserted.borrow()[0].commenttext, "");
    }

    #[test]
    fn test_failed_init_writes_no_table() {
        let mut source = MemorySource::new(&["id", "comment", "contextlevel"], &[&["1", "a", "10"]]);
        source.fail_init = true;
        let upload = ValidatedUpload::new(source, ActingUser::new(1)).unwrap();

        let mut out = Vec::new();
        let result = upload.commit(&FakeStore::default(), &mut out);
        assert!(matches!(result, Err(UploadError::Import(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_commit_of_header_only_upload() {
        let source = MemorySource::new(&["id", "comment", "contextlevel"], &[]);
        let upload = ValidatedUpload::new(source, ActingUser::new(1)).unwrap();
        let mut out = Vec::new();
        let summary = upload.commit(&FakeStore::default(), &mut out).unwrap();
        assert_eq!(summary.uploaded, 0);
        let html = String::from_utf8(out).unwrap();
        assert!(!html.contains("<tr class=\"r1\">"));
        assert!(html.ends_with("</table>\n"));
    }

    proptest! {
        #[test]
        fn prop_commit_of_n_rows_inserts_n(n in 0usize..40) {
            let source = MemorySource {
                columns: Some(vec!["comment".into(), "contextlevel".into(), "contextid".into()]),
                rows: (0..n).map(|i| vec![format!("comment {i}"), "50".into(), i.to_string()]).collect(),
                ..Default::default()
            };
            let upload = ValidatedUpload::new(source, ActingUser::new(3)).unwrap();
            let store = FakeStore::default();
            let mut out = Vec::new();

            let summary = upload.commit(&store, &mut out).unwrap();
            prop_assert_eq!(summary.uploaded, n);
            prop_assert_eq!(store.inserted.borrow().len(), n);

            let html = String::from_utf8(out).unwrap();
            prop_assert_eq!(html.matches("<tr class=\"r1\">").count(), n);
        }
    }
}
