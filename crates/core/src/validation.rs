//! Input validation utilities.
//!
//! Uploads are validated by their declared media type only. The document content is never
//! inspected; that is the generator's business.

use crate::constants::{DOCX_EXTENSION, DOCX_MIME_TYPE};
use crate::{CoreError, CoreResult};

/// Validates the media type declared for an uploaded file.
///
/// Parameters after `;` are ignored and the comparison is case-insensitive, so
/// `Application/VND...document; charset=binary` is accepted.
///
/// # Errors
///
/// Returns `CoreError::UnsupportedFileType` if the declared type is missing or is not the
/// `.docx` media type.
pub fn validate_upload_media_type(declared: Option<&str>) -> CoreResult<()> {
    let essence = declared
        .and_then(|d| d.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if essence.eq_ignore_ascii_case(DOCX_MIME_TYPE) {
        Ok(())
    } else {
        Err(CoreError::UnsupportedFileType(declared.map(str::to_string)))
    }
}

/// Returns true when `filename` ends with `.docx`.
///
/// This is the presentation client's check; the server relies on the media type instead.
pub fn has_docx_extension(filename: &str) -> bool {
    filename.ends_with(DOCX_EXTENSION)
}
