use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::models::{Brand, BrandSummary};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::slug::slugify;
use crate::state::AppState;
use crate::upload;
use crate::validation::{optional_text, required_text, FieldErrors};

const DUPLICATE_MSG: &str = "brand name or slug already exists";

/// GET /api/brands - All brands, minimal projection, ordered by name
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<BrandSummary>>, ApiError> {
    let rows = sqlx::query_as::<_, BrandSummary>(
        "SELECT id, name, slug FROM brands ORDER BY name ASC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

/// GET /api/brands/:slug - Full brand row
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Brand>, ApiError> {
    let brand = sqlx::query_as::<_, Brand>(
        "SELECT id, name, slug, description, image_url FROM brands WHERE slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("brand not found"))?;

    Ok(Json(brand))
}

/// POST /api/brands - Create a brand, optionally with a brandImage upload
pub async fn create(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Brand>), ApiError> {
    let form = upload::read_form(multipart, "brandImage").await?;

    let mut errors = FieldErrors::new();
    let name = required_text(form.text("name"), "name", &mut errors);
    errors.into_result()?;

    let name = name.unwrap();
    let description = optional_text(form.text("description"));
    let image_url = form.image.as_ref().map(|img| img.url.clone());

    let brand = sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (id, name, slug, description, image_url) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, name, slug, description, image_url",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(slugify(&name))
    .bind(&description)
    .bind(&image_url)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    Ok((StatusCode::CREATED, Json(brand)))
}

/// PUT /api/brands/:id - Update name/description, re-deriving the slug;
/// the image URL changes only when a new file was supplied.
pub async fn update(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = upload::read_form(multipart, "brandImage").await?;

    let mut errors = FieldErrors::new();
    let name = required_text(form.text("name"), "name", &mut errors);
    errors.into_result()?;

    let name = name.unwrap();
    let description = optional_text(form.text("description"));

    let result = match &form.image {
        Some(image) => {
            sqlx::query(
                "UPDATE brands SET name = $1, slug = $2, description = $3, image_url = $4 \
                 WHERE id = $5",
            )
            .bind(&name)
            .bind(slugify(&name))
            .bind(&description)
            .bind(&image.url)
            .bind(id)
            .execute(&state.pool)
            .await
        }
        None => {
            sqlx::query("UPDATE brands SET name = $1, slug = $2, description = $3 WHERE id = $4")
                .bind(&name)
                .bind(slugify(&name))
                .bind(&description)
                .bind(id)
                .execute(&state.pool)
                .await
        }
    }
    .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("brand not found"));
    }

    Ok(Json(json!({ "msg": "brand updated" })))
}

/// DELETE /api/brands/:id - Remove the row, then best-effort image cleanup
pub async fn remove(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let image_url = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM brands WHERE id = $1 RETURNING image_url",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("brand not found"))?;

    if let Some(url) = image_url {
        upload::remove_stored_image(&url).await;
    }

    Ok(Json(json!({ "msg": "brand deleted" })))
}
