use std::sync::Arc;

use tracing::info;

use crate::document::{NewDocument, StoredDocument};
use crate::error::IngestError;
use crate::extract::page_content;
use crate::fetch::PageFetcher;
use crate::schema::{validate_schema, SchemaCheck};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub table: String,
    pub target_url: String,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub url: String,
    pub content_chars: usize,
    pub check: SchemaCheck,
    pub stored: Option<StoredDocument>,
}

/// Validate, fetch, extract and store one page. Any failing stage ends the run.
#[derive(Clone)]
pub struct Runner {
    store: Arc<dyn Store>,
    fetcher: Arc<dyn PageFetcher>,
    options: RunOptions,
}

impl Runner {
    pub fn new(store: Arc<dyn Store>, fetcher: Arc<dyn PageFetcher>, options: RunOptions) -> Self {
        Self {
            store,
            fetcher,
            options,
        }
    }

    pub async fn validate(&self) -> Result<SchemaCheck, IngestError> {
        validate_schema(self.store.as_ref(), &self.options.table).await
    }

    pub async fn run(&self) -> Result<RunReport, IngestError> {
        let check = self.validate().await?;

        let url = self.options.target_url.as_str();
        info!("Fetching {}", url);
        let body = self
            .fetcher
            .get(url)
            .await
            .map_err(|source| IngestError::Fetch {
                url: url.to_string(),
                source,
            })?;

        let content = page_content(&body);
        let content_chars = content.chars().count();
        info!("Extracted text ({} chars)", content_chars);
        if content.is_empty() {
            return Err(IngestError::EmptyContent {
                url: url.to_string(),
            });
        }

        let doc = NewDocument::with_placeholder(content, url);
        let rows = self.store.insert(&self.options.table, &doc).await?;
        let stored = rows.first().map(StoredDocument::from_row);
        match stored.as_ref().and_then(|s| s.id) {
            Some(id) => info!("Stored document #{} in {}", id, self.options.table),
            None => info!("Stored document in {}", self.options.table),
        }

        Ok(RunReport {
            url: url.to_string(),
            content_chars,
            check,
            stored,
        })
    }
}
