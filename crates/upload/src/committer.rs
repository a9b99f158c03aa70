// Comment construction and insertion for the commit pass

use std::io::Write;

use commentbank_core::fields::{COMMENT, CONTEXT_ID, CONTEXT_LEVEL};
use commentbank_core::{ActingUser, CommentRecord, ContextLevel};
use commentbank_io::RecordStore;

use crate::error::UploadError;
use crate::html::{escape, strip_tags};
use crate::tracker::ProgressTracker;

/// Maps columns whose name starts with `prefix` onto the record, and says
/// what to show for them in the results table.
struct FieldRule {
    prefix: &'static str,
    apply: fn(&mut CommentRecord, &str),
    display: fn(&str) -> Option<(&'static str, String)>,
}

const FIELD_RULES: [FieldRule; 3] = [
    FieldRule { prefix: COMMENT, apply: set_comment, display: show_comment },
    FieldRule { prefix: CONTEXT_LEVEL, apply: set_context_level, display: show_context_level },
    FieldRule { prefix: CONTEXT_ID, apply: set_instance, display: show_instance },
];

fn set_comment(record: &mut CommentRecord, value: &str) {
    record.commenttext = strip_tags(value);
}

fn set_context_level(record: &mut CommentRecord, value: &str) {
    record.contextlevel = Some(value.to_string());
}

fn set_instance(record: &mut CommentRecord, value: &str) {
    record.instanceid = Some(value.to_string());
}

fn show_comment(value: &str) -> Option<(&'static str, String)> {
    Some(("comment", escape(value)))
}

fn show_context_level(value: &str) -> Option<(&'static str, String)> {
    ContextLevel::parse(value).map(|level| ("context", level.name().to_string()))
}

fn show_instance(value: &str) -> Option<(&'static str, String)> {
    Some(("instance", escape(value)))
}

/// Build the record for one row. `columns` are the validated header names.
///
/// Every column is matched against the rule prefixes, so `comments` or
/// `contextlevel_code` headers are picked up too. Cells past the end of
/// `columns` are ignored.
pub fn build_comment(columns: &[String], row: &[String], user: ActingUser, now: i64) -> CommentRecord {
    let mut record = CommentRecord {
        authoredby: user.id,
        timecreated: now,
        timemodified: now,
        ..Default::default()
    };
    for (key, value) in columns.iter().zip(row) {
        for rule in FIELD_RULES.iter().filter(|rule| key.starts_with(rule.prefix)) {
            (rule.apply)(&mut record, value);
        }
    }
    record
}

/// Build, track and insert the record for one row, returning the new id.
pub fn commit_row<R, W>(
    store: &R,
    tracker: &mut ProgressTracker<W>,
    columns: &[String],
    row: &[String],
    user: ActingUser,
    now: i64,
) -> Result<i64, UploadError>
where
    R: RecordStore + ?Sized,
    W: Write,
{
    for (key, value) in columns.iter().zip(row) {
        for rule in FIELD_RULES.iter().filter(|rule| key.starts_with(rule.prefix)) {
            if let Some((column, text)) = (rule.display)(value) {
                tracker.track(column, &text)?;
            }
        }
    }

    let record = build_comment(columns, row, user, now);
    Ok(store.insert_comment(&record)?)
}
