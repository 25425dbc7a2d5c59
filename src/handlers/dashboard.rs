use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /api/dashboard/stats - Entity counts for the admin dashboard.
/// The four counts run concurrently on separate pool connections.
pub async fn stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let count = |table: &'static str| {
        let pool = state.pool.clone();
        async move {
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(&pool)
                .await
        }
    };

    let (total_parfum, total_brand, total_category, total_notes) = tokio::try_join!(
        count("parfum"),
        count("brands"),
        count("categories"),
        count("notes"),
    )?;

    Ok(Json(json!({
        "totalParfum": total_parfum,
        "totalBrand": total_brand,
        "totalCategory": total_category,
        "totalNotes": total_notes,
    })))
}
