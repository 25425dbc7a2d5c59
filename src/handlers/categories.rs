use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{Category, CategorySummary};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::slug::slugify;
use crate::state::AppState;
use crate::validation::{optional_text, required_text, FieldErrors};

const DUPLICATE_MSG: &str = "category name or slug already exists";

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// GET /api/categories - All categories, minimal projection, ordered by name
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let rows = sqlx::query_as::<_, CategorySummary>(
        "SELECT id, name, slug FROM categories ORDER BY name ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

/// GET /api/categories/:slug - Full category row
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Category>, ApiError> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, description FROM categories WHERE slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("category not found"))?;

    Ok(Json(category))
}

/// POST /api/categories - Create a category
pub async fn create(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let mut errors = FieldErrors::new();
    let name = required_text(payload.name.as_ref(), "name", &mut errors);
    errors.into_result()?;

    let name = name.unwrap();
    let description = optional_text(payload.description.as_ref());

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, slug, description) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id, name, slug, description",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(slugify(&name))
    .bind(&description)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// PUT /api/categories/:id - Update a category, re-deriving the slug
pub async fn update(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = FieldErrors::new();
    let name = required_text(payload.name.as_ref(), "name", &mut errors);
    errors.into_result()?;

    let name = name.unwrap();
    let description = optional_text(payload.description.as_ref());

    let result =
        sqlx::query("UPDATE categories SET name = $1, slug = $2, description = $3 WHERE id = $4")
            .bind(&name)
            .bind(slugify(&name))
            .bind(&description)
            .bind(id)
            .execute(&state.pool)
            .await
            .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("category not found"));
    }

    Ok(Json(json!({ "msg": "category updated" })))
}

/// DELETE /api/categories/:id - Remove the row (categories carry no image)
pub async fn remove(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("category not found"));
    }

    Ok(Json(json!({ "msg": "category deleted" })))
}
