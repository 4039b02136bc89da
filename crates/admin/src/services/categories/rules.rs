//! Field-level validation of category inputs.

use super::CategoryError;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 100;
pub const SLUG_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const META_TITLE_MAX_CHARS: usize = 60;
pub const META_DESCRIPTION_MAX_CHARS: usize = 160;

/// Trim and validate a category name.
///
/// # Errors
///
/// Returns `CategoryError::Validation` if the name is blank or out of bounds.
pub fn name(raw: &str) -> Result<String, CategoryError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(invalid("Category name is required"));
    }

    let chars = name.chars().count();
    if chars < NAME_MIN_CHARS {
        return Err(invalid("Category name must be at least 3 characters"));
    }
    if chars > NAME_MAX_CHARS {
        return Err(invalid("Category name cannot exceed 100 characters"));
    }

    Ok(name.to_string())
}

/// Validate an optional free-text field against its length limit.
///
/// # Errors
///
/// Returns `CategoryError::Validation` naming `label` when too long.
pub fn bounded(label: &str, value: Option<&str>, max: usize) -> Result<(), CategoryError> {
    match value {
        Some(v) if v.chars().count() > max => Err(CategoryError::Validation(format!(
            "{label} cannot exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Validate a caller-supplied slug hint before normalization.
///
/// # Errors
///
/// Returns `CategoryError::Validation` if the hint is too long.
pub fn slug_hint(value: Option<&str>) -> Result<(), CategoryError> {
    bounded("Category slug", value, SLUG_MAX_CHARS)
}

/// Validate the optional display/SEO strings shared by create and update.
///
/// # Errors
///
/// Returns the first `CategoryError::Validation` encountered.
pub fn display_fields(
    description: Option<&str>,
    meta_title: Option<&str>,
    meta_description: Option<&str>,
) -> Result<(), CategoryError> {
    bounded("Description", description, DESCRIPTION_MAX_CHARS)?;
    bounded("Meta title", meta_title, META_TITLE_MAX_CHARS)?;
    bounded("Meta description", meta_description, META_DESCRIPTION_MAX_CHARS)
}

/// Validate a sibling sort position.
///
/// # Errors
///
/// Returns `CategoryError::Validation` for negative values.
pub fn sort_order(value: Option<i32>) -> Result<(), CategoryError> {
    match value {
        Some(v) if v < 0 => Err(invalid("Sort order cannot be negative")),
        _ => Ok(()),
    }
}

fn invalid(message: &str) -> CategoryError {
    CategoryError::Validation(message.to_string())
}
