//! Table-store adapter for a PostgREST endpoint (Supabase `rest/v1`).

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::{Filter, Row, Store, StoreError};
use crate::document::NewDocument;

pub struct PostgrestStore {
    client: Client,
    base_url: String,
}

impl PostgrestStore {
    /// `project_url` is the project root (e.g. `https://xyz.supabase.co`), not
    /// the `rest/v1` path.
    pub fn new(project_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!project_url.trim().is_empty(), "missing store URL");
        anyhow::ensure!(!api_key.trim().is_empty(), "missing store API key");

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(api_key.trim()).context("invalid store API key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.trim()))
                .context("invalid store API key")?,
        );
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build store HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", project_url.trim().trim_end_matches('/')),
        })
    }

    fn endpoint(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }
}

/// Error body PostgREST returns on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn transport_error(err: reqwest::Error) -> StoreError {
    StoreError::new(None, err.to_string())
}

/// Turn a non-2xx response into a [`StoreError`], passing the message through.
async fn error_from_response(resp: Response) -> StoreError {
    let status = resp.status();
    let text = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            code,
            message: Some(message),
        }) => StoreError::new(code, message),
        _ if text.trim().is_empty() => StoreError::new(None, format!("store returned {}", status)),
        _ => StoreError::new(None, format!("store returned {}: {}", status, text.trim())),
    }
}

async fn rows(resp: Response) -> Result<Vec<Row>, StoreError> {
    if !resp.status().is_success() {
        return Err(error_from_response(resp).await);
    }
    resp.json::<Vec<Row>>().await.map_err(transport_error)
}

#[async_trait]
impl Store for PostgrestStore {
    async fn select(&self, collection: &str, limit: usize) -> Result<Vec<Row>, StoreError> {
        debug!("select {} limit {}", collection, limit);
        let resp = self
            .client
            .get(self.endpoint(collection))
            .query(&[("select", "*".to_string()), ("limit", limit.to_string())])
            .send()
            .await
            .map_err(transport_error)?;
        rows(resp).await
    }

    async fn insert(&self, collection: &str, doc: &NewDocument) -> Result<Vec<Row>, StoreError> {
        debug!("insert into {} ({} chars)", collection, doc.content.chars().count());
        let resp = self
            .client
            .post(self.endpoint(collection))
            .header("Prefer", "return=representation")
            .json(doc)
            .send()
            .await
            .map_err(transport_error)?;
        rows(resp).await
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<(), StoreError> {
        debug!("delete from {} where {} = {}", collection, filter.column, filter.value);
        let resp = self
            .client
            .delete(self.endpoint(collection))
            .query(&[(filter.column.as_str(), format!("eq.{}", filter.value))])
            .send()
            .await
            .map_err(transport_error)?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp).await);
        }
        Ok(())
    }
}
