//! Fetch one page, extract its visible text and store it with a placeholder
//! embedding, after checking the target collection's shape.

pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod runner;
pub mod schedule;
pub mod schema;
pub mod server;
pub mod store;

pub use document::{NewDocument, StoredDocument, EMBEDDING_DIM, MAX_CONTENT_CHARS};
pub use error::{ErrorKind, IngestError};
pub use runner::{RunOptions, RunReport, Runner};
pub use schema::{validate_schema, SchemaCheck};
