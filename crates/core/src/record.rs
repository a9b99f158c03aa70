/// The user an upload is performed on behalf of. Stamped as the author of
/// every committed comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActingUser {
    pub id: i64,
}

impl ActingUser {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

/// A comment bank entry as persisted by the record store.
///
/// `contextlevel` and `instanceid` hold the values exactly as read from the
/// upload file. The commit pass does not validate them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentRecord {
    pub commenttext: String,
    pub contextlevel: Option<String>,
    pub instanceid: Option<String>,
    pub authoredby: i64,
    /// Unix seconds
    pub timecreated: i64,
    /// Unix seconds
    pub timemodified: i64,
}
