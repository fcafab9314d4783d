//! Existence and shape check for the documents collection.
//!
//! The store exposes no metadata query, so shape is learned from data: the
//! first row if there is one, otherwise a disposable probe insert whose
//! rejection names the missing column.

use std::collections::BTreeSet;

use tracing::{error, info, warn};

use crate::document::{NewDocument, EMBEDDING_DIM, REQUIRED_COLUMNS};
use crate::error::IngestError;
use crate::store::{Filter, Store};

/// `url` of the probe record. Nothing with this url survives validation.
pub const PROBE_URL: &str = "http://test.com";

/// How a successful validation reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaCheck {
    /// An existing row exposed every required column.
    Inspected,
    /// The collection was empty and a probe insert went through.
    Probed,
}

/// DDL creating a collection that satisfies the validator.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE {table} (\n  \
         id SERIAL PRIMARY KEY,\n  \
         content TEXT NOT NULL,\n  \
         embedding vector({EMBEDDING_DIM}) NOT NULL,\n  \
         url TEXT,\n  \
         created_at TIMESTAMPTZ DEFAULT NOW()\n\
         );"
    )
}

/// Column type recommended when `column` has to be added.
pub fn column_type(column: &str) -> String {
    if column == "embedding" {
        format!("vector({})", EMBEDDING_DIM)
    } else {
        "TEXT".to_string()
    }
}

pub fn add_column_sql(table: &str, column: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {};",
        table,
        column,
        column_type(column)
    )
}

fn probe_document() -> NewDocument {
    NewDocument {
        content: "test".to_string(),
        embedding: vec![0.0; EMBEDDING_DIM],
        url: Some(PROBE_URL.to_string()),
    }
}

/// Confirm `table` exists and exposes `content`, `embedding` and `url`.
///
/// An empty table is probed with one insert, which is deleted again once it
/// succeeds. A failed delete is reported as a store error and leaves the probe
/// row behind.
pub async fn validate_schema(store: &dyn Store, table: &str) -> Result<SchemaCheck, IngestError> {
    let result = check(store, table).await;
    if let Err(e) = &result {
        error!("Schema validation failed: {}", e);
    }
    result
}

async fn check(store: &dyn Store, table: &str) -> Result<SchemaCheck, IngestError> {
    let rows = match store.select(table, 1).await {
        Ok(rows) => rows,
        Err(e) if e.is_relation_missing() => {
            return Err(IngestError::SchemaMissing {
                table: table.to_string(),
                ddl: create_table_sql(table),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let Some(first) = rows.first() else {
        return probe(store, table).await;
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !first.contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::SchemaIncomplete {
            table: table.to_string(),
            missing,
        });
    }

    let extra: BTreeSet<&str> = first
        .keys()
        .map(String::as_str)
        .filter(|k| !REQUIRED_COLUMNS.contains(k))
        .collect();
    info!("Schema OK: {} has required columns (others: {:?})", table, extra);
    Ok(SchemaCheck::Inspected)
}

async fn probe(store: &dyn Store, table: &str) -> Result<SchemaCheck, IngestError> {
    info!("{} is empty, probing shape with a test insert", table);
    if let Err(e) = store.insert(table, &probe_document()).await {
        return Err(match e.missing_column() {
            Some(column) => IngestError::SchemaIncomplete {
                table: table.to_string(),
                missing: vec![column.to_string()],
            },
            None => e.into(),
        });
    }

    if let Err(e) = store.delete(table, &Filter::eq("url", PROBE_URL)).await {
        warn!("Probe row with url {} left in {}", PROBE_URL, table);
        return Err(e.into());
    }
    info!("Schema OK: probe insert into {} accepted and removed", table);
    Ok(SchemaCheck::Probed)
}
