// User-facing text of the upload pages

pub const UPLOAD_PREVIEW: &str = "Upload comments preview";
pub const UPLOAD_RESULTS: &str = "Upload comments results";

// Table headings
pub const CSV_LINE: &str = "CSV line";
pub const COMMENT: &str = "Comment";
pub const CONTEXT: &str = "Context";
pub const INSTANCE: &str = "Instance";
pub const STATUS: &str = "Status";

// Row status
pub const ADDED: &str = "Added";
pub const MISSING_COMMENT: &str = "Missing comment";
pub const INCORRECT_CATEGORY_ID: &str = "Incorrect category id";
pub const INCORRECT_COURSE_ID: &str = "Incorrect course id";
pub const INCORRECT_ASSIGNMENT_ID: &str = "Incorrect assignment id";
pub const INCORRECT_CONTEXT: &str = "Incorrect context";

pub const COMMENTS_ADDED: &str = "Comments added";

/// Instance cell shown for system context comments
pub const NOT_APPLICABLE: &str = "N/A";

/// Cell text of the row marking more data past the preview sample
pub const ELIDED: &str = "...";
