use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::store::Row;

/// Length of every stored embedding vector.
pub const EMBEDDING_DIM: usize = 384;

/// Hard cap on stored content, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Columns a usable collection must expose.
pub const REQUIRED_COLUMNS: [&str; 3] = ["content", "embedding", "url"];

/// Value of every element in the stand-in embedding written by real runs.
pub const PLACEHOLDER_VALUE: f32 = 0.1;

/// Record as sent to the store. `id` and `created_at` are assigned store-side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewDocument {
    pub content: String,
    pub embedding: Vec<f32>,
    pub url: Option<String>,
}

impl NewDocument {
    /// Document carrying the placeholder embedding.
    pub fn with_placeholder(content: String, url: &str) -> Self {
        NewDocument {
            content,
            embedding: placeholder_embedding(),
            url: Some(url.to_string()),
        }
    }

    pub fn embedding_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.embedding)
    }
}

/// Stand-in for a model embedding: `EMBEDDING_DIM` copies of 0.1.
pub fn placeholder_embedding() -> Vec<f32> {
    vec![PLACEHOLDER_VALUE; EMBEDDING_DIM]
}

/// Store-assigned fields of an inserted document. Everything is optional
/// because the store decides what it hands back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoredDocument {
    pub id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

impl StoredDocument {
    pub fn from_row(row: &Row) -> Self {
        StoredDocument {
            id: row.get("id").and_then(|v| v.as_i64()),
            created_at: row
                .get("created_at")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}
