use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::{NoteRef, ParfumDetail, ParfumListItem, Pyramid};
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::slug::slugify;
use crate::state::AppState;
use crate::upload;
use crate::validation::{
    optional_id, optional_launch_year, optional_text, required_text, FieldErrors,
};

const DUPLICATE_MSG: &str = "parfum name or slug already exists";

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl Pagination {
    fn new(page: i64, limit: i64, total_items: i64) -> Self {
        Self {
            page,
            limit,
            total_items,
            total_pages: (total_items + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<ParfumListItem>,
    pub pagination: Pagination,
}

/// Push the AND-composed list filters shared by the data and count
/// queries. Counting with the same predicate keeps the pagination
/// metadata consistent with the returned page.
fn push_filters(builder: &mut QueryBuilder<Postgres>, query: &ListQuery) {
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        builder
            .push(" AND p.name ILIKE ")
            .push_bind(format!("%{}%", search.trim()));
    }
    if let Some(brand) = query.brand.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND b.slug = ").push_bind(brand.to_string());
    }
    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        builder.push(" AND c.slug = ").push_bind(category.to_string());
    }
}

/// GET /api/parfum - Filtered, paginated catalog listing
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = (page - 1) * limit;

    let mut data_query = QueryBuilder::<Postgres>::new(
        "SELECT p.id, p.name, p.slug, p.image_url, \
                b.name AS brand_name, b.slug AS brand_slug, \
                c.name AS category_name, c.slug AS category_slug \
         FROM parfum p \
         LEFT JOIN brands b ON p.brand_id = b.id \
         LEFT JOIN categories c ON p.category_id = c.id \
         WHERE 1=1",
    );
    push_filters(&mut data_query, &query);
    data_query
        .push(" ORDER BY p.name ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let data = data_query
        .build_query_as::<ParfumListItem>()
        .fetch_all(&state.pool)
        .await?;

    let mut count_query = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) \
         FROM parfum p \
         LEFT JOIN brands b ON p.brand_id = b.id \
         LEFT JOIN categories c ON p.category_id = c.id \
         WHERE 1=1",
    );
    push_filters(&mut count_query, &query);

    let total_items = count_query
        .build_query_scalar::<i64>()
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(ListResponse {
        data,
        pagination: Pagination::new(page, limit, total_items),
    }))
}

#[derive(Debug, FromRow)]
struct PyramidRow {
    name: String,
    slug: String,
    note_type: String,
}

/// Group join rows into the three ordered pyramid buckets
fn group_pyramid(rows: Vec<PyramidRow>) -> Pyramid {
    let mut pyramid = Pyramid::default();

    for row in rows {
        let note = NoteRef {
            name: row.name,
            slug: row.slug,
        };
        match row.note_type.as_str() {
            "TOP" => pyramid.top.push(note),
            "MIDDLE" => pyramid.middle.push(note),
            "BASE" => pyramid.base.push(note),
            other => tracing::warn!("Unknown note type in pyramid: {}", other),
        }
    }

    pyramid
}

/// GET /api/parfum/:slug - Detail page: perfume joined with brand and
/// category, plus the grouped scent pyramid.
pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ParfumDetail>, ApiError> {
    let mut parfum = sqlx::query_as::<_, ParfumDetail>(
        "SELECT p.id, p.name, p.slug, p.description, p.launch_year, p.brand_id, \
                p.category_id, p.image_url, p.created_at, p.updated_at, \
                b.name AS brand_name, b.slug AS brand_slug, \
                c.name AS category_name, c.slug AS category_slug \
         FROM parfum p \
         LEFT JOIN brands b ON p.brand_id = b.id \
         LEFT JOIN categories c ON p.category_id = c.id \
         WHERE p.slug = $1",
    )
    .bind(&slug)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("parfum not found"))?;

    let rows = sqlx::query_as::<_, PyramidRow>(
        "SELECT n.name, n.slug, pn.note_type \
         FROM parfum_notes pn \
         JOIN notes n ON pn.note_id = n.id \
         WHERE pn.parfum_id = $1 \
         ORDER BY CASE pn.note_type WHEN 'TOP' THEN 1 WHEN 'MIDDLE' THEN 2 ELSE 3 END, n.name",
    )
    .bind(parfum.id)
    .fetch_all(&state.pool)
    .await?;

    parfum.pyramid = group_pyramid(rows);

    Ok(Json(parfum))
}

struct ParfumInput {
    name: String,
    description: Option<String>,
    launch_year: Option<i32>,
    brand_id: Option<Uuid>,
    category_id: Option<Uuid>,
}

fn parse_parfum_fields(form: &upload::SubmittedForm) -> Result<ParfumInput, ApiError> {
    let mut errors = FieldErrors::new();
    let name = required_text(form.text("name"), "name", &mut errors);
    let launch_year = optional_launch_year(form.text("launchYear"), "launchYear", &mut errors);
    let brand_id = optional_id(form.text("brandId"), "brandId", &mut errors);
    let category_id = optional_id(form.text("categoryId"), "categoryId", &mut errors);
    errors.into_result()?;

    Ok(ParfumInput {
        name: name.unwrap(),
        description: optional_text(form.text("description")),
        launch_year,
        brand_id,
        category_id,
    })
}

/// POST /api/parfum - Create a perfume, optionally with a parfumImage upload
pub async fn create(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = upload::read_form(multipart, "parfumImage").await?;
    let input = parse_parfum_fields(&form)?;

    let new_id = Uuid::new_v4();
    let slug = slugify(&input.name);
    let image_url = form.image.as_ref().map(|img| img.url.clone());
    let now = Utc::now();

    sqlx::query(
        "INSERT INTO parfum (id, name, slug, description, launch_year, brand_id, \
                             category_id, image_url, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)",
    )
    .bind(new_id)
    .bind(&input.name)
    .bind(&slug)
    .bind(&input.description)
    .bind(input.launch_year)
    .bind(input.brand_id)
    .bind(input.category_id)
    .bind(&image_url)
    .bind(now)
    .execute(&state.pool)
    .await
    .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": new_id, "slug": slug, "imageUrl": image_url })),
    ))
}

/// PUT /api/parfum/:id - Update a perfume, re-deriving the slug and
/// bumping updated_at; the image URL changes only when a new file arrived.
pub async fn update(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = upload::read_form(multipart, "parfumImage").await?;
    let input = parse_parfum_fields(&form)?;

    let slug = slugify(&input.name);
    let now = Utc::now();

    let result = match &form.image {
        Some(image) => {
            sqlx::query(
                "UPDATE parfum SET name = $1, slug = $2, description = $3, launch_year = $4, \
                        brand_id = $5, category_id = $6, image_url = $7, updated_at = $8 \
                 WHERE id = $9",
            )
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.description)
            .bind(input.launch_year)
            .bind(input.brand_id)
            .bind(input.category_id)
            .bind(&image.url)
            .bind(now)
            .bind(id)
            .execute(&state.pool)
            .await
        }
        None => {
            sqlx::query(
                "UPDATE parfum SET name = $1, slug = $2, description = $3, launch_year = $4, \
                        brand_id = $5, category_id = $6, updated_at = $7 \
                 WHERE id = $8",
            )
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.description)
            .bind(input.launch_year)
            .bind(input.brand_id)
            .bind(input.category_id)
            .bind(now)
            .bind(id)
            .execute(&state.pool)
            .await
        }
    }
    .map_err(|e| super::conflict_on_duplicate(e, DUPLICATE_MSG))?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("parfum not found"));
    }

    Ok(Json(json!({ "msg": "parfum updated" })))
}

/// PUT /api/parfum/:id/upload - Attach an uploaded image to a perfume
pub async fn upload_image(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let form = upload::read_form(multipart, "parfumImage").await?;

    let image = form
        .image
        .ok_or_else(|| ApiError::bad_request("no file was uploaded"))?;

    let result = sqlx::query("UPDATE parfum SET image_url = $1, updated_at = $2 WHERE id = $3")
        .bind(&image.url)
        .bind(Utc::now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        // The file landed on disk before we knew the row was missing.
        upload::remove_stored_image(&image.url).await;
        return Err(ApiError::not_found("parfum not found"));
    }

    Ok(Json(json!({ "msg": "image uploaded", "imageUrl": image.url })))
}

/// DELETE /api/parfum/:id - Remove the row (join rows cascade at the
/// schema level), then best-effort image cleanup.
pub async fn remove(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let image_url = sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM parfum WHERE id = $1 RETURNING image_url",
    )
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("parfum not found"))?;

    if let Some(url) = image_url {
        upload::remove_stored_image(&url).await;
    }

    Ok(Json(json!({ "msg": "parfum deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_is_ceiling_of_items_over_limit() {
        assert_eq!(Pagination::new(1, 5, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 5, 5).total_pages, 1);
        assert_eq!(Pagination::new(1, 5, 6).total_pages, 2);
        assert_eq!(Pagination::new(2, 5, 11).total_pages, 3);
    }

    #[test]
    fn groups_rows_into_pyramid_buckets() {
        let rows = vec![
            PyramidRow { name: "Bergamot".into(), slug: "bergamot".into(), note_type: "TOP".into() },
            PyramidRow { name: "Rose".into(), slug: "rose".into(), note_type: "MIDDLE".into() },
            PyramidRow { name: "Jasmine".into(), slug: "jasmine".into(), note_type: "MIDDLE".into() },
            PyramidRow { name: "Musk".into(), slug: "musk".into(), note_type: "BASE".into() },
        ];

        let pyramid = group_pyramid(rows);
        assert_eq!(pyramid.top.len(), 1);
        assert_eq!(pyramid.middle.len(), 2);
        assert_eq!(pyramid.base.len(), 1);
        assert_eq!(pyramid.top[0].slug, "bergamot");
    }

    #[test]
    fn unknown_note_types_are_dropped() {
        let rows = vec![PyramidRow {
            name: "X".into(),
            slug: "x".into(),
            note_type: "HEART".into(),
        }];
        let pyramid = group_pyramid(rows);
        assert!(pyramid.top.is_empty() && pyramid.middle.is_empty() && pyramid.base.is_empty());
    }
}
