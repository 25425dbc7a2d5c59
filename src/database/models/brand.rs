use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Brand {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Minimal projection for the public listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BrandSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
