// Upload file field names

/// Header names the upload file is expected to carry.
pub const REQUIRED_FIELDS: [&str; 4] = [ID, COMMENT, CONTEXT_LEVEL, CONTEXT_ID];

pub const ID: &str = "id";
pub const COMMENT: &str = "comment";
pub const CONTEXT_LEVEL: &str = "contextlevel";
pub const CONTEXT_ID: &str = "contextid";

/// A header must have at least this many columns to be accepted.
pub const MIN_COLUMNS: usize = 3;

/// Display label for a column in the preview table.
pub fn display_label(column: &str) -> &str {
    match column {
        CONTEXT_LEVEL => "Context",
        CONTEXT_ID => "Instance",
        other => other,
    }
}
