use std::collections::HashMap;
use uuid::Uuid;

use crate::error::ApiError;

pub const LAUNCH_YEAR_MIN: i32 = 1000;
pub const LAUNCH_YEAR_MAX: i32 = 2099;

/// Aggregated field-level validation errors.
///
/// Checks run as a pipeline over the submitted fields; every failed
/// predicate records its message here and the request fails once with
/// the full map, mirroring declarative validation-chain middleware.
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert accumulated errors into the request's failure, if any
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid input", Some(self.0)))
        }
    }
}

/// Required non-empty string field; records an error when missing or blank.
pub fn required_text(
    value: Option<&String>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.add(field, format!("{} is required", field));
            None
        }
    }
}

/// Optional string field; blank input is treated as absent.
pub fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Optional launch year bounded to the catalog's valid range.
pub fn optional_launch_year(
    value: Option<&String>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<i32> {
    let raw = optional_text(value)?;

    match raw.parse::<i32>() {
        Ok(year) if (LAUNCH_YEAR_MIN..=LAUNCH_YEAR_MAX).contains(&year) => Some(year),
        _ => {
            errors.add(
                field,
                format!("{} must be between {} and {}", field, LAUNCH_YEAR_MIN, LAUNCH_YEAR_MAX),
            );
            None
        }
    }
}

/// Optional foreign-key field; blank input is absent, anything else must
/// parse as an id.
pub fn optional_id(
    value: Option<&String>,
    field: &str,
    errors: &mut FieldErrors,
) -> Option<Uuid> {
    let raw = optional_text(value)?;

    match raw.parse::<Uuid>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, format!("{} is not a valid id", field));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_flags_blank_values() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required_text(Some(&"  Chanel  ".to_string()), "name", &mut errors),
            Some("Chanel".to_string())
        );
        assert!(errors.is_empty());

        assert_eq!(required_text(Some(&"   ".to_string()), "name", &mut errors), None);
        assert_eq!(required_text(None, "name", &mut errors), None);
        assert!(!errors.is_empty());
    }

    #[test]
    fn launch_year_bounds_are_enforced() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            optional_launch_year(Some(&"1999".to_string()), "launchYear", &mut errors),
            Some(1999)
        );
        assert_eq!(
            optional_launch_year(Some(&"1000".to_string()), "launchYear", &mut errors),
            Some(1000)
        );
        assert_eq!(
            optional_launch_year(Some(&"2099".to_string()), "launchYear", &mut errors),
            Some(2099)
        );
        assert!(errors.is_empty());

        assert_eq!(optional_launch_year(Some(&"999".to_string()), "launchYear", &mut errors), None);
        assert_eq!(optional_launch_year(Some(&"2100".to_string()), "launchYear", &mut errors), None);
        assert_eq!(optional_launch_year(Some(&"abc".to_string()), "launchYear", &mut errors), None);
        assert!(!errors.is_empty());
    }

    #[test]
    fn blank_optional_fields_are_absent_not_errors() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_launch_year(Some(&"".to_string()), "launchYear", &mut errors), None);
        assert_eq!(optional_id(Some(&"  ".to_string()), "brandId", &mut errors), None);
        assert_eq!(optional_text(Some(&"".to_string())), None);
        assert!(errors.is_empty());
    }

    #[test]
    fn invalid_ids_are_field_errors() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            optional_id(Some(&"not-a-uuid".to_string()), "brandId", &mut errors),
            None
        );
        assert!(!errors.is_empty());

        let id = Uuid::new_v4();
        let mut errors = FieldErrors::new();
        assert_eq!(
            optional_id(Some(&id.to_string()), "brandId", &mut errors),
            Some(id)
        );
        assert!(errors.is_empty());
    }
}
