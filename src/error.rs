use thiserror::Error;

use crate::fetch::FetchError;
use crate::schema::add_column_sql;
use crate::store::StoreError;

/// Failure classes reported to whoever invoked the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemaMissing,
    SchemaIncomplete,
    StoreError,
    FetchError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::SchemaMissing => "schema_missing",
            ErrorKind::SchemaIncomplete => "schema_incomplete",
            ErrorKind::StoreError => "store_error",
            ErrorKind::FetchError => "fetch_error",
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Table '{table}' doesn't exist. Run this SQL:\n{ddl}")]
    SchemaMissing { table: String, ddl: String },

    #[error("{}", incomplete_message(.table, .missing))]
    SchemaIncomplete { table: String, missing: Vec<String> },

    /// Passed through with the store's message untouched.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The page was fetched fine but had nothing to store.
    #[error("Page {url} was fetched but returned no visible text")]
    EmptyContent { url: String },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::SchemaMissing { .. } => ErrorKind::SchemaMissing,
            IngestError::SchemaIncomplete { .. } => ErrorKind::SchemaIncomplete,
            IngestError::Store(_) => ErrorKind::StoreError,
            IngestError::Fetch { .. } | IngestError::EmptyContent { .. } => ErrorKind::FetchError,
        }
    }
}

fn incomplete_message(table: &str, missing: &[String]) -> String {
    let label = if missing.len() == 1 { "column" } else { "columns" };
    let fixes: Vec<String> = missing.iter().map(|c| add_column_sql(table, c)).collect();
    format!(
        "Missing {}: {}. Run:\n{}",
        label,
        missing.join(", "),
        fixes.join("\n")
    )
}
