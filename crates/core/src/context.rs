/// What a comment is attached to.
///
/// The numeric codes are part of the upload file format and of the stored
/// record, so they never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextLevel {
    System,
    Category,
    Course,
    Assignment,
}

/// Where the display name for an instance id lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLookup {
    pub table: &'static str,
    pub field: &'static str,
}

impl ContextLevel {
    pub const ALL: [ContextLevel; 4] = [
        ContextLevel::System,
        ContextLevel::Category,
        ContextLevel::Course,
        ContextLevel::Assignment,
    ];

    pub fn code(&self) -> i64 {
        match self {
            Self::System => 10,
            Self::Category => 40,
            Self::Course => 50,
            Self::Assignment => 70,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.code() == code)
    }

    /// Parse a raw cell value. Surrounding whitespace is ignored and the
    /// comparison is numeric, so `040` is a category.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<i64>().ok().and_then(Self::from_code)
    }

    /// Capitalised label used in the preview table.
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Category => "Category",
            Self::Course => "Course",
            Self::Assignment => "Assignment",
        }
    }

    /// Lowercase name used in the results table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Category => "category",
            Self::Course => "course",
            Self::Assignment => "assignment",
        }
    }

    /// Table and field holding the instance name. System has no instance.
    pub fn lookup(&self) -> Option<InstanceLookup> {
        match self {
            Self::System => None,
            Self::Category => Some(InstanceLookup { table: "course_categories", field: "name" }),
            Self::Course => Some(InstanceLookup { table: "course", field: "shortname" }),
            Self::Assignment => Some(InstanceLookup { table: "assign", field: "name" }),
        }
    }
}
