pub mod auth;
pub mod brands;
pub mod categories;
pub mod dashboard;
pub mod notes;
pub mod parfum;
pub mod parfum_notes;

use crate::error::ApiError;

/// Translate a unique-constraint violation into a resource-specific
/// conflict; everything else falls through to the generic mapping.
pub(crate) fn conflict_on_duplicate(err: sqlx::Error, message: &str) -> ApiError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return ApiError::conflict(message);
        }
    }
    err.into()
}
