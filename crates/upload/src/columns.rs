// Header validation for uploaded comment files

use commentbank_core::fields::MIN_COLUMNS;
use commentbank_io::ImportSource;

use crate::error::UploadError;

/// Check the header row of `source` and normalise standard field names.
///
/// Returns one name per column, in column order. A cell whose text, or
/// lowercased text, is one of `std_fields` becomes the lowercase form;
/// anything else is kept as written. Presence of every standard field is not
/// checked.
///
/// On failure the source is closed and its stored upload removed before the
/// error is returned.
pub fn validate_upload_columns<S>(source: &mut S, std_fields: &[&str]) -> Result<Vec<String>, UploadError>
where
    S: ImportSource + ?Sized,
{
    let columns = match source.get_columns() {
        Some(columns) => columns.to_vec(),
        None => {
            release(source);
            return Err(UploadError::CannotReadTmpFile);
        }
    };

    if columns.len() < MIN_COLUMNS {
        release(source);
        return Err(UploadError::FewColumns { found: columns.len(), min: MIN_COLUMNS });
    }

    let processed = columns
        .into_iter()
        .map(|field| {
            let lcfield = field.to_lowercase();
            if std_fields.contains(&field.as_str()) || std_fields.contains(&lcfield.as_str()) {
                lcfield
            } else {
                field
            }
        })
        .collect();

    Ok(processed)
}

fn release<S: ImportSource + ?Sized>(source: &mut S) {
    source.close();
    if let Err(e) = source.cleanup(false) {
        log::warn!("could not remove rejected upload: {e}");
    }
}
