// Context resolution for the preview pass

use commentbank_core::ContextLevel;
use commentbank_io::{RecordStore, StoreError};

use crate::strings;

/// Display values for the context columns of one preview row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Shown in the `contextlevel` cell
    pub context: String,
    /// Shown in the `contextid` cell
    pub instance: String,
    /// Problem to report in the row status, if any
    pub status: Option<&'static str>,
}

/// Turn a raw context level and instance id into display names.
///
/// An instance id that names nothing is reported in `status` and leaves the
/// instance cell empty. Unknown levels are never looked up.
pub fn resolve<R>(store: &R, level: &str, instance: &str) -> Result<Resolution, StoreError>
where
    R: RecordStore + ?Sized,
{
    let Some(context) = ContextLevel::parse(level) else {
        return Ok(Resolution {
            context: level.to_string(),
            instance: instance.to_string(),
            status: Some(strings::INCORRECT_CONTEXT),
        });
    };

    let Some(lookup) = context.lookup() else {
        return Ok(Resolution {
            context: context.label().to_string(),
            instance: strings::NOT_APPLICABLE.to_string(),
            status: None,
        });
    };

    let resolution = match store.get_field(lookup.table, lookup.field, instance)? {
        Some(name) => Resolution {
            context: context.label().to_string(),
            instance: name,
            status: None,
        },
        None => Resolution {
            context: context.label().to_string(),
            instance: String::new(),
            status: Some(incorrect_id_message(context)),
        },
    };
    Ok(resolution)
}

fn incorrect_id_message(context: ContextLevel) -> &'static str {
    match context {
        ContextLevel::Category => strings::INCORRECT_CATEGORY_ID,
        ContextLevel::Course => strings::INCORRECT_COURSE_ID,
        ContextLevel::Assignment => strings::INCORRECT_ASSIGNMENT_ID,
        ContextLevel::System => strings::INCORRECT_CONTEXT,
    }
}
