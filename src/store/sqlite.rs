//! Local table-store adapter over SQLite.
//!
//! Mirrors the remote `documents` layout closely enough to exercise the
//! validator and runner without a network: embeddings are JSON text with a
//! length check standing in for `vector(384)`.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use serde_json::Value;

use super::{quote_ident, Filter, Row, Store, StoreError};
use crate::document::{NewDocument, EMBEDDING_DIM};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    /// Create `table` with the document columns if it does not exist yet.
    pub fn init_schema(&self, table: &str) -> Result<()> {
        self.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {table} (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                content    TEXT NOT NULL,
                embedding  TEXT NOT NULL CHECK (json_array_length(embedding) = {dim}),
                url        TEXT,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );
            CREATE INDEX IF NOT EXISTS {index} ON {table}(url);
            ",
            table = quote_ident(table),
            index = quote_ident(&format!("idx_{}_url", table)),
            dim = EMBEDDING_DIM,
        ))
    }

    /// Run raw SQL against the underlying connection.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| StoreError::new(None, "sqlite connection mutex poisoned"))?;
        f(&conn).map_err(store_error)
    }
}

fn store_error(err: rusqlite::Error) -> StoreError {
    StoreError::new(None, err.to_string())
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::from(b.to_vec()),
    }
}

fn collect_rows(stmt: &mut rusqlite::Statement<'_>, params: impl rusqlite::Params) -> rusqlite::Result<Vec<Row>> {
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query(params)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut map = Row::new();
        for (i, name) in names.iter().enumerate() {
            map.insert(name.clone(), to_json(row.get_ref(i)?));
        }
        out.push(map);
    }
    Ok(out)
}

#[async_trait]
impl Store for SqliteStore {
    async fn select(&self, collection: &str, limit: usize) -> Result<Vec<Row>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT * FROM {} LIMIT {}",
                quote_ident(collection),
                limit
            ))?;
            collect_rows(&mut stmt, [])
        })
    }

    async fn insert(&self, collection: &str, doc: &NewDocument) -> Result<Vec<Row>, StoreError> {
        let embedding = doc
            .embedding_json()
            .map_err(|e| StoreError::new(None, format!("failed to encode embedding: {}", e)))?;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "INSERT INTO {} (content, embedding, url) VALUES (?1, ?2, ?3) RETURNING *",
                quote_ident(collection)
            ))?;
            collect_rows(&mut stmt, rusqlite::params![doc.content, embedding, doc.url])
        })
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1",
                    quote_ident(collection),
                    quote_ident(&filter.column)
                ),
                rusqlite::params![filter.value],
            )?;
            Ok(())
        })
    }
}
