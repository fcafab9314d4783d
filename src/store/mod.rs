//! Remote table-store boundary.
//!
//! Both adapters report failures as [`StoreError`]. Error codes and message
//! text are inspected in exactly one place, [`classify`], so callers only ever
//! match on [`StoreErrorKind`].

pub mod postgrest;
pub mod sqlite;

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::document::NewDocument;

pub use postgrest::PostgrestStore;
pub use sqlite::SqliteStore;

/// One stored row: column name to value.
pub type Row = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Return at most `limit` rows of `collection`.
    async fn select(&self, collection: &str, limit: usize) -> Result<Vec<Row>, StoreError>;

    /// Insert one record and return the stored representation.
    async fn insert(&self, collection: &str, doc: &NewDocument) -> Result<Vec<Row>, StoreError>;

    /// Delete every row matching `filter`.
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<(), StoreError>;
}

/// Equality filter on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter {
            column: column.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The collection does not exist.
    RelationMissing,
    /// A write referenced a column the collection lacks.
    ColumnMissing { column: String },
    Other,
}

/// Failure reported by a store. Displays as the store's own message.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    /// Build an error from a store-defined code and message, classifying it.
    pub fn new(code: Option<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = classify(code.as_deref(), &message);
        StoreError {
            kind,
            code,
            message,
        }
    }

    pub fn is_relation_missing(&self) -> bool {
        self.kind == StoreErrorKind::RelationMissing
    }

    pub fn missing_column(&self) -> Option<&str> {
        match &self.kind {
            StoreErrorKind::ColumnMissing { column } => Some(column),
            _ => None,
        }
    }
}

// Postgres undefined_table, and PostgREST's "table not in schema cache".
const RELATION_MISSING_CODES: [&str; 2] = ["42P01", "PGRST205"];

fn missing_column_patterns() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        [
            // postgres: column "embedding" of relation "documents" does not exist
            r#"column "([^"]+)"(?: of relation "[^"]+")? does not exist"#,
            // postgrest: Could not find the 'embedding' column of 'documents' in the schema cache
            r"Could not find the '([^']+)' column",
            // sqlite: table documents has no column named embedding
            r"has no column named (\w+)",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Translate a store's code and message into a [`StoreErrorKind`].
pub fn classify(code: Option<&str>, message: &str) -> StoreErrorKind {
    if code.is_some_and(|c| RELATION_MISSING_CODES.contains(&c))
        || message.starts_with("no such table")
    {
        return StoreErrorKind::RelationMissing;
    }

    missing_column_patterns()
        .iter()
        .find_map(|re| re.captures(message)?.get(1))
        .map(|m| StoreErrorKind::ColumnMissing {
            column: m.as_str().to_string(),
        })
        .unwrap_or(StoreErrorKind::Other)
}

/// Quote an SQL identifier, escaping embedded quotes.
pub fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}
