use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// Minimal projection for the public listing
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NoteSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Note reference inside a pyramid bucket
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NoteRef {
    pub name: String,
    pub slug: String,
}

/// Position of a note in the scent pyramid.
///
/// Stored as TEXT in parfum_notes.note_type with a matching CHECK
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NoteType {
    Top,
    Middle,
    Base,
}

impl NoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Top => "TOP",
            NoteType::Middle => "MIDDLE",
            NoteType::Base => "BASE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_type_matches_stored_representation() {
        assert_eq!(NoteType::Top.as_str(), "TOP");
        assert_eq!(NoteType::Middle.as_str(), "MIDDLE");
        assert_eq!(NoteType::Base.as_str(), "BASE");
    }
}
