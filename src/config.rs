use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::runner::RunOptions;
use crate::store::{PostgrestStore, SqliteStore, Store};

pub const DEFAULT_TARGET_URL: &str = "https://example.com";
pub const DEFAULT_TABLE: &str = "documents";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Page fetched on every run.
    pub target_url: String,
    pub table: String,
    /// Applies to page fetches and store requests alike.
    pub request_timeout_secs: u64,
    pub bind: String,
    /// Use a local SQLite file instead of the remote store.
    pub sqlite_path: Option<PathBuf>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Settings {
    /// Defaults, then `INGEST_*` variables, then `SUPABASE_URL` / `SUPABASE_KEY`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(None)
    }

    /// Same as [`Settings::load`] but reads `vars` instead of the process
    /// environment when given.
    pub fn from_vars(vars: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        let lookup = |name: &str| match &vars {
            Some(v) => v.get(name).cloned(),
            None => std::env::var(name).ok(),
        };

        Config::builder()
            .set_default("target_url", DEFAULT_TARGET_URL)?
            .set_default("table", DEFAULT_TABLE)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("bind", "127.0.0.1:3000")?
            .add_source(
                Environment::with_prefix("INGEST")
                    .try_parsing(true)
                    .source(vars.clone()),
            )
            .set_override_option("supabase_url", lookup("SUPABASE_URL"))?
            .set_override_option("supabase_key", lookup("SUPABASE_KEY"))?
            .build()?
            .try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            table: self.table.clone(),
            target_url: self.target_url.clone(),
        }
    }

    /// Open the configured backend. The remote store needs both credentials.
    pub fn open_store(&self) -> Result<Arc<dyn Store>> {
        if let Some(path) = &self.sqlite_path {
            return Ok(Arc::new(SqliteStore::open(path)?));
        }
        let url = self
            .supabase_url
            .as_deref()
            .context("SUPABASE_URL environment variable must be set")?;
        let key = self
            .supabase_key
            .as_deref()
            .context("SUPABASE_KEY environment variable must be set")?;
        Ok(Arc::new(PostgrestStore::new(url, key, self.timeout())?))
    }
}
