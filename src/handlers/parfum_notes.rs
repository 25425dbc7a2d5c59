use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::NoteType;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PyramidRequest {
    #[serde(default)]
    pub top: Vec<Uuid>,
    #[serde(default)]
    pub middle: Vec<Uuid>,
    #[serde(default)]
    pub base: Vec<Uuid>,
}

/// Flatten the request buckets into (note_id, note_type) join rows
fn stage_rows(request: &PyramidRequest) -> Vec<(Uuid, NoteType)> {
    let buckets = [
        (&request.top, NoteType::Top),
        (&request.middle, NoteType::Middle),
        (&request.base, NoteType::Base),
    ];

    buckets
        .iter()
        .flat_map(|(ids, note_type)| ids.iter().map(move |id| (*id, *note_type)))
        .collect()
}

/// PUT /api/parfum/:parfumId/notes - Replace the whole scent pyramid.
///
/// Delete-then-bulk-insert inside one transaction: either the new
/// pyramid replaces the old one completely, or the old one survives
/// untouched. A partial replacement is never observable.
pub async fn replace_pyramid(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(parfum_id): Path<Uuid>,
    Json(payload): Json<PyramidRequest>,
) -> Result<Json<Value>, ApiError> {
    let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM parfum WHERE id = $1")
        .bind(parfum_id)
        .fetch_optional(&state.pool)
        .await?;

    if exists.is_none() {
        return Err(ApiError::not_found("parfum not found"));
    }

    let rows = stage_rows(&payload);

    // Dropping the transaction on any early return rolls everything back.
    let mut tx = state.pool.begin().await?;

    sqlx::query("DELETE FROM parfum_notes WHERE parfum_id = $1")
        .bind(parfum_id)
        .execute(&mut *tx)
        .await?;

    if !rows.is_empty() {
        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO parfum_notes (id, parfum_id, note_id, note_type) ",
        );
        builder.push_values(rows.iter(), |mut b, (note_id, note_type)| {
            b.push_bind(Uuid::new_v4())
                .push_bind(parfum_id)
                .push_bind(note_id)
                .push_bind(note_type.as_str());
        });

        builder.build().execute(&mut *tx).await.map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return ApiError::bad_request("one or more note ids do not exist");
                }
            }
            e.into()
        })?;
    }

    tx.commit().await?;

    Ok(Json(json!({ "msg": "scent pyramid updated" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_one_row_per_note_tagged_with_its_bucket() {
        let top = Uuid::new_v4();
        let middle_a = Uuid::new_v4();
        let middle_b = Uuid::new_v4();

        let request = PyramidRequest {
            top: vec![top],
            middle: vec![middle_a, middle_b],
            base: vec![],
        };

        let rows = stage_rows(&request);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], (top, NoteType::Top));
        assert_eq!(rows[1], (middle_a, NoteType::Middle));
        assert_eq!(rows[2], (middle_b, NoteType::Middle));
    }

    #[test]
    fn empty_buckets_stage_nothing() {
        let rows = stage_rows(&PyramidRequest::default());
        assert!(rows.is_empty());
    }

    #[test]
    fn missing_buckets_default_to_empty() {
        let request: PyramidRequest = serde_json::from_str(r#"{"top": []}"#).unwrap();
        assert!(request.top.is_empty());
        assert!(request.middle.is_empty());
        assert!(request.base.is_empty());
    }
}
