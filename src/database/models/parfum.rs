use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::note::NoteRef;

/// Listing row joined with brand/category names for the catalog pages
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParfumListItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub brand_name: Option<String>,
    pub brand_slug: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// The three ordered note buckets describing a perfume's scent profile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pyramid {
    pub top: Vec<NoteRef>,
    pub middle: Vec<NoteRef>,
    pub base: Vec<NoteRef>,
}

/// Detail view: the full perfume row joined with brand/category names,
/// plus the assembled pyramid.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ParfumDetail {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub launch_year: Option<i32>,
    pub brand_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub brand_name: Option<String>,
    pub brand_slug: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
    #[sqlx(skip)]
    pub pyramid: Pyramid,
}
