//! Table source trait
//!
//! This trait defines the interface the API handlers talk to. The shipped
//! implementation is [`crate::source::postgrest::PostgrestSource`]; tests use
//! in-memory stand-ins.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::query::{MutationSpec, QuerySpec};
use crate::schema::{ColumnMode, RowsPage, TableInfo};

/// Source of tables, rows, and mutations for the explorer
///
/// Every method maps to one user interaction and issues at most a handful of
/// upstream requests; nothing is retried and failures surface as
/// [`SourceError`].
#[async_trait]
pub trait TableSource: Send + Sync + 'static {
    /// List queryable tables, optionally with per-table row counts
    ///
    /// `refresh` bypasses the cached schema document.
    async fn list_tables(
        &self,
        with_counts: bool,
        refresh: bool,
    ) -> Result<Vec<TableInfo>, SourceError>;

    /// Discover the column list for a table
    ///
    /// `mode` selects the discovery strategy; `refresh` bypasses the
    /// per-table column cache.
    async fn table_columns(
        &self,
        table: &str,
        mode: ColumnMode,
        refresh: bool,
    ) -> Result<Vec<String>, SourceError>;

    /// Debug: every schema component related to the table, with its columns
    async fn related_schemas(
        &self,
        table: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, SourceError>;

    /// Fetch one page of rows, with the filtered total when known
    async fn fetch_rows(&self, table: &str, spec: &QuerySpec) -> Result<RowsPage, SourceError>;

    /// Exact row count for the query's filters; `None` when the server
    /// reports the total as unknown
    async fn count_rows(&self, table: &str, spec: &QuerySpec) -> Result<Option<u64>, SourceError>;

    /// Execute a validated mutation and return the representation rows
    async fn mutate(
        &self,
        table: &str,
        mutation: &MutationSpec,
    ) -> Result<Vec<Value>, SourceError>;

    /// Drop every cached artifact (schema document, columns, counts)
    async fn invalidate(&self);
}

/// Errors surfaced by a [`TableSource`]
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connectivity or timeout failure before any response arrived
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A credential contained characters not allowed in an HTTP header
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// Upstream returned a non-2xx status; body text passed through verbatim
    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body was not valid JSON
    #[error("malformed JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed, but not to the expected shape
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The OpenAPI document has no `paths` object to discover tables from
    #[error("schema document has no paths; cannot discover tables")]
    MissingPaths,

    /// No column list could be discovered from any source
    #[error("no columns discovered for table '{0}'")]
    NoColumns(String),

    /// UPDATE or DELETE without a usable filter clause
    #[error("refusing unscoped {0}: a filter column and value are required")]
    UnscopedMutation(&'static str),

    /// INSERT or UPDATE with nothing to write
    #[error("mutation payload is empty")]
    EmptyPayload,

    /// A filter operator string the explorer does not know
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
}

impl SourceError {
    /// Construct a [`SourceError::Status`] from an upstream response
    pub fn from_status(status: u16, body: String) -> Self {
        SourceError::Status { status, body }
    }

    /// A human hint for well-known PostgREST failure modes, if any applies
    ///
    /// 406 means PostgREST expected a singular result and got many rows;
    /// `PGRST116` in the body text is the same condition spelled as an error
    /// code.
    pub fn postgrest_hint(&self) -> Option<&'static str> {
        let SourceError::Status { status, body } = self else {
            return None;
        };
        if *status == 406 {
            Some("the server refused to return this many rows for a singular request; reduce the page size or add filters")
        } else if body.contains("PGRST116") {
            Some("PGRST116: the response contains more rows than PostgREST expected for a single object")
        } else {
            None
        }
    }
}
