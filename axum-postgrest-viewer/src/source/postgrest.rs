//! PostgREST table source implementation
//!
//! One [`PostgrestSource`] corresponds to one connected session. It owns the
//! upstream HTTP client plus the short-lived caches (schema document,
//! per-table columns, per-table counts) and exposes explicit invalidation
//! instead of ambient global state. Each operation issues synchronous-style
//! requests with a bounded timeout; nothing is retried.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_RANGE};
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::connection::{Connection, ACCEPT_JSON, ACCEPT_OPENAPI};
use crate::openapi;
use crate::query::{parse_content_range, MutationSpec, QuerySpec};
use crate::schema::{ColumnMode, RowsPage, TableInfo};
use crate::source::traits::{SourceError, TableSource};

/// Timeout for fetching the OpenAPI document
const OPENAPI_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for row page fetches, the largest transfers
const ROWS_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for filtered count probes
const COUNT_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for the per-table count probes in table listings; these fan out
/// one request per table, so they get the shortest budget
const TABLE_COUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for mutations
const MUTATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for column-inference sampling
const SAMPLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of rows sampled when inferring columns from live data
const SAMPLE_SIZE: u64 = 10;

/// Table source backed by a PostgREST-compatible REST API
pub struct PostgrestSource {
    client: Client,
    connection: Connection,
    document: RwLock<Option<Value>>,
    columns: RwLock<HashMap<(String, ColumnMode), Vec<String>>>,
    counts: RwLock<HashMap<String, Option<u64>>>,
}

impl PostgrestSource {
    /// Create a source for the given connection
    pub fn new(connection: Connection) -> Self {
        Self {
            client: Client::new(),
            connection,
            document: RwLock::new(None),
            columns: RwLock::new(HashMap::new()),
            counts: RwLock::new(HashMap::new()),
        }
    }

    /// The connection this source talks to
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Fetch (or serve from cache) the OpenAPI document
    async fn document(&self, refresh: bool) -> Result<Value, SourceError> {
        if !refresh {
            if let Some(document) = self.document.read().await.clone() {
                return Ok(document);
            }
        }

        let url = self.connection.root_url();
        debug!(url = %url, "fetching OpenAPI document");
        let response = self
            .client
            .get(&url)
            .headers(self.connection.headers(ACCEPT_OPENAPI)?)
            .timeout(OPENAPI_TIMEOUT)
            .send()
            .await?;
        let document: Value = serde_json::from_str(&Self::success_body(response).await?)?;

        *self.document.write().await = Some(document.clone());
        Ok(document)
    }

    /// Read the response body, converting non-2xx statuses into errors
    ///
    /// The body text is passed through verbatim so PostgREST's own error
    /// messages reach the user unedited.
    async fn success_body(response: Response) -> Result<String, SourceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "upstream request failed");
            return Err(SourceError::from_status(status.as_u16(), body));
        }
        Ok(response.text().await?)
    }

    /// Issue a count probe and parse the `Content-Range` total
    async fn probe_count(
        &self,
        table: &str,
        params: &[(String, String)],
        timeout: Duration,
    ) -> Result<Option<u64>, SourceError> {
        let mut headers = self.connection.headers(ACCEPT_JSON)?;
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self
            .client
            .get(self.connection.table_url(table))
            .headers(headers)
            .query(params)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::from_status(status.as_u16(), body));
        }

        Ok(response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range))
    }

    /// Cached per-table count; degrades to `None` on any failure
    async fn table_count(&self, table: &str) -> Option<u64> {
        if let Some(cached) = self.counts.read().await.get(table) {
            return *cached;
        }

        let params = [
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let total = self
            .probe_count(table, &params, TABLE_COUNT_TIMEOUT)
            .await
            .ok()
            .flatten();

        self.counts.write().await.insert(table.to_string(), total);
        total
    }

    /// Best-effort column inference from a small live sample
    ///
    /// Only columns that were non-null in at least one sampled row show up,
    /// so this never errors; an empty or unreadable sample just yields `None`.
    async fn sample_columns(&self, table: &str) -> Option<Vec<String>> {
        let params = [
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), SAMPLE_SIZE.to_string()),
        ];

        let response = self
            .client
            .get(self.connection.table_url(table))
            .headers(self.connection.headers(ACCEPT_JSON).ok()?)
            .query(&params)
            .timeout(SAMPLE_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }

        let rows: Vec<Value> = response.json().await.ok()?;
        openapi::columns_from_rows(&rows)
    }
}

#[async_trait]
impl TableSource for PostgrestSource {
    async fn list_tables(
        &self,
        with_counts: bool,
        refresh: bool,
    ) -> Result<Vec<TableInfo>, SourceError> {
        let document = self.document(refresh).await?;
        let names = openapi::tables_from_document(&document).ok_or(SourceError::MissingPaths)?;

        if refresh {
            self.counts.write().await.clear();
        }

        let mut tables = Vec::with_capacity(names.len());
        for name in names {
            let row_count = if with_counts {
                self.table_count(&name).await
            } else {
                None
            };
            tables.push(TableInfo { name, row_count });
        }
        Ok(tables)
    }

    async fn table_columns(
        &self,
        table: &str,
        mode: ColumnMode,
        refresh: bool,
    ) -> Result<Vec<String>, SourceError> {
        let key = (table.to_string(), mode);
        if !refresh {
            if let Some(cached) = self.columns.read().await.get(&key) {
                return Ok(cached.clone());
            }
        }

        let declared = match mode {
            ColumnMode::Sample => None,
            ColumnMode::OpenApi | ColumnMode::Combined => {
                let document = self.document(false).await?;
                openapi::columns_from_document(&document, &self.connection.schema, table)
            }
        };

        let sampled = match mode {
            ColumnMode::OpenApi => None,
            ColumnMode::Sample | ColumnMode::Combined => self.sample_columns(table).await,
        };

        // Union of both sources, deliberately permissive: a column present in
        // only one source is still offered.
        let mut union = BTreeSet::new();
        union.extend(declared.into_iter().flatten());
        union.extend(sampled.into_iter().flatten());

        if union.is_empty() {
            return Err(SourceError::NoColumns(table.to_string()));
        }

        let columns: Vec<String> = union.into_iter().collect();
        self.columns.write().await.insert(key, columns.clone());
        Ok(columns)
    }

    async fn related_schemas(
        &self,
        table: &str,
    ) -> Result<BTreeMap<String, Vec<String>>, SourceError> {
        let document = self.document(false).await?;
        Ok(openapi::related_schemas(&document, table))
    }

    async fn fetch_rows(&self, table: &str, spec: &QuerySpec) -> Result<RowsPage, SourceError> {
        let url = self.connection.table_url(table);
        debug!(url = %url, page = spec.page, limit = spec.limit(), "fetching rows");

        let response = self
            .client
            .get(&url)
            .headers(self.connection.headers(ACCEPT_JSON)?)
            .query(&spec.params())
            .timeout(ROWS_TIMEOUT)
            .send()
            .await?;
        let body: Value = serde_json::from_str(&Self::success_body(response).await?)?;

        let Some(rows) = body.as_array().cloned() else {
            return Err(SourceError::UnexpectedShape(format!(
                "expected a JSON array of rows, got: {}",
                abbreviate(&body.to_string())
            )));
        };

        let columns = if spec.select.is_empty() {
            openapi::columns_from_rows(&rows).unwrap_or_default()
        } else {
            spec.select
                .iter()
                .map(|column| column.trim().to_string())
                .filter(|column| !column.is_empty())
                .collect()
        };

        // The count is a separate request; if it fails the page is still
        // useful, so the total degrades to unknown instead.
        let total = self.count_rows(table, spec).await.ok().flatten();

        let offset = spec.offset();
        let has_more = total.map(|total| offset.saturating_add(rows.len() as u64) < total);

        Ok(RowsPage {
            rows,
            columns,
            total,
            page: spec.page.max(1),
            page_size: spec.limit(),
            offset,
            has_more,
        })
    }

    async fn count_rows(&self, table: &str, spec: &QuerySpec) -> Result<Option<u64>, SourceError> {
        self.probe_count(table, &spec.count_params(), COUNT_TIMEOUT)
            .await
    }

    async fn mutate(
        &self,
        table: &str,
        mutation: &MutationSpec,
    ) -> Result<Vec<Value>, SourceError> {
        mutation.validate()?;

        let url = self.connection.table_url(table);
        let mut headers = self.connection.headers(ACCEPT_JSON)?;
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let request = match mutation {
            MutationSpec::Insert { payload } => {
                debug!(url = %url, "insert");
                self.client.post(&url).json(payload)
            }
            MutationSpec::Update { payload, filter } => {
                debug!(url = %url, column = %filter.column, "update");
                self.client
                    .patch(&url)
                    .query(&mutation.filter_params())
                    .json(payload)
            }
            MutationSpec::Delete { filter } => {
                debug!(url = %url, column = %filter.column, "delete");
                self.client.delete(&url).query(&mutation.filter_params())
            }
        };

        let response = request.headers(headers).timeout(MUTATION_TIMEOUT).send().await?;
        let body = Self::success_body(response).await?;

        // Some deployments answer 204 with an empty body despite the
        // representation preference.
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Value>(&body)? {
            Value::Array(rows) => Ok(rows),
            object @ Value::Object(_) => Ok(vec![object]),
            other => Err(SourceError::UnexpectedShape(format!(
                "expected a representation array, got: {}",
                abbreviate(&other.to_string())
            ))),
        }
    }

    async fn invalidate(&self) {
        *self.document.write().await = None;
        self.columns.write().await.clear();
        self.counts.write().await.clear();
    }
}

/// Trim long bodies before they end up in an error message
fn abbreviate(text: &str) -> String {
    const LIMIT: usize = 500;
    if text.len() <= LIMIT {
        text.to_string()
    } else {
        let cut = text
            .char_indices()
            .take_while(|(index, _)| *index < LIMIT)
            .map(|(index, character)| index + character.len_utf8())
            .last()
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_short_text() {
        assert_eq!(abbreviate("short"), "short");
    }

    #[test]
    fn test_abbreviate_long_text() {
        let long = "x".repeat(600);
        let abbreviated = abbreviate(&long);
        assert!(abbreviated.ends_with("..."));
        assert!(abbreviated.len() < long.len());
    }

    #[tokio::test]
    async fn test_invalidate_clears_caches() {
        let source = PostgrestSource::new(Connection::new("https://api.example.com", "key"));
        source
            .counts
            .write()
            .await
            .insert("users".to_string(), Some(3));
        source
            .columns
            .write()
            .await
            .insert(("users".to_string(), ColumnMode::Combined), vec!["id".to_string()]);

        source.invalidate().await;

        assert!(source.counts.read().await.is_empty());
        assert!(source.columns.read().await.is_empty());
        assert!(source.document.read().await.is_none());
    }
}
