use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// Minimal projection for the public listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}
