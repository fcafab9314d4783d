#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use page_ingest::fetch::{FetchError, PageFetcher};
use page_ingest::store::{Filter, Row, SqliteStore, Store, StoreError};
use page_ingest::NewDocument;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Select { collection: String, limit: usize },
    Insert { collection: String, doc: NewDocument },
    Delete { collection: String, filter: Filter },
}

/// Store double answering every call with a canned result and logging it.
pub struct ScriptedStore {
    select: Result<Vec<Row>, StoreError>,
    insert: Result<Vec<Row>, StoreError>,
    delete: Result<(), StoreError>,
    delete_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self {
            select: Ok(Vec::new()),
            insert: Ok(Vec::new()),
            delete: Ok(()),
            delete_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn select_returns(mut self, result: Result<Vec<Row>, StoreError>) -> Self {
        self.select = result;
        self
    }

    pub fn insert_returns(mut self, result: Result<Vec<Row>, StoreError>) -> Self {
        self.insert = result;
        self
    }

    pub fn delete_returns(mut self, result: Result<(), StoreError>) -> Self {
        self.delete = result;
        self
    }

    /// Hold every delete for `delay` before it is logged and answered.
    pub fn delete_after(mut self, delay: Duration) -> Self {
        self.delete_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn select(&self, collection: &str, limit: usize) -> Result<Vec<Row>, StoreError> {
        self.log(Call::Select {
            collection: collection.to_string(),
            limit,
        });
        self.select.clone()
    }

    async fn insert(&self, collection: &str, doc: &NewDocument) -> Result<Vec<Row>, StoreError> {
        self.log(Call::Insert {
            collection: collection.to_string(),
            doc: doc.clone(),
        });
        self.insert.clone()
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<(), StoreError> {
        if let Some(delay) = self.delete_delay {
            tokio::time::sleep(delay).await;
        }
        self.log(Call::Delete {
            collection: collection.to_string(),
            filter: filter.clone(),
        });
        self.delete.clone()
    }
}

/// Fetcher serving a fixed body and counting requests.
pub struct StaticPage {
    body: String,
    hits: AtomicUsize,
}

impl StaticPage {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            hits: AtomicUsize::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StaticPage {
    async fn get(&self, _url: &str) -> Result<String, FetchError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

pub fn row(value: Value) -> Row {
    value.as_object().cloned().expect("row must be a JSON object")
}

pub fn full_row() -> Row {
    row(json!({
        "id": 1,
        "content": "existing",
        "embedding": "[0.1,0.1]",
        "url": "https://example.com",
        "created_at": "2026-10-16T00:00:00Z"
    }))
}

pub fn relation_missing() -> StoreError {
    StoreError::new(
        Some("42P01".to_string()),
        r#"relation "public.documents" does not exist"#,
    )
}

pub fn sqlite_with_table() -> Arc<SqliteStore> {
    let store = SqliteStore::open_in_memory().unwrap();
    store.init_schema("documents").unwrap();
    Arc::new(store)
}

/// Rows whose `url` equals `url`.
pub async fn rows_with_url(store: &dyn Store, url: &str) -> Vec<Row> {
    store
        .select("documents", 1000)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.get("url").and_then(|v| v.as_str()) == Some(url))
        .collect()
}

pub fn parse_embedding(value: &Value) -> Vec<f32> {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap(),
        other => serde_json::from_value(other.clone()).unwrap(),
    }
}
