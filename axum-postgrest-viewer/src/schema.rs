//! Wire types for the explorer's own HTTP API
//!
//! These are the request/response shapes the embedded frontend talks to,
//! all camelCase on the wire.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::coerce::coerce_payload;
use crate::query::{FilterClause, FilterOp, MutationSpec, QuerySpec, SortDirection};
use crate::source::traits::SourceError;

/// Hard cap on page size to bound upstream transfer size
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Information about a table (for listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    /// Table name
    pub name: String,

    /// Exact row count; `None` when unknown (failed probe or `*` total)
    pub row_count: Option<u64>,
}

/// Response from listing tables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablesResponse {
    pub tables: Vec<TableInfo>,
}

/// Column discovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ColumnMode {
    /// Only what the OpenAPI schema components declare
    OpenApi,

    /// Only what a live row sample exposes (misses all-null columns)
    Sample,

    /// Union of both sources; the permissive default
    #[default]
    Combined,
}

/// Response from column discovery
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsResponse {
    pub table: String,
    pub columns: Vec<String>,
    pub mode: ColumnMode,
}

/// Query parameters for table listing
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableListQuery {
    /// Probe each table for an exact row count (one extra request per table)
    #[serde(default)]
    pub counts: bool,

    /// Refetch the schema document instead of using the cache
    #[serde(default)]
    pub refresh: bool,
}

/// Query parameters for column discovery
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ColumnsQuery {
    #[serde(default)]
    pub mode: ColumnMode,

    #[serde(default)]
    pub refresh: bool,
}

/// Query parameters for fetching rows
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,

    /// Page size; capped at [`MAX_PAGE_SIZE`]
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Comma-separated column list; absent or empty means `*`
    pub select: Option<String>,

    /// Column to sort by
    pub sort_by: Option<String>,

    /// Sort direction, `asc` (default) or `desc`
    pub sort_order: Option<SortDirection>,

    /// Filter clause column
    pub filter_column: Option<String>,

    /// Filter clause operator
    pub filter_op: Option<FilterOp>,

    /// Filter clause value
    pub filter_value: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    100
}

impl Default for RowQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
            select: None,
            sort_by: None,
            sort_order: None,
            filter_column: None,
            filter_op: None,
            filter_value: None,
        }
    }
}

impl RowQuery {
    /// Convert the raw query parameters into a [`QuerySpec`]
    pub fn to_spec(&self) -> QuerySpec {
        let mut spec = QuerySpec::new(self.page.max(1), self.page_size.clamp(1, MAX_PAGE_SIZE));

        if let Some(select) = &self.select {
            spec.select = select
                .split(',')
                .map(str::trim)
                .filter(|column| !column.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(column) = self.sort_by.as_deref().filter(|column| !column.is_empty()) {
            spec.order = Some((
                column.to_string(),
                self.sort_order.unwrap_or(SortDirection::Asc),
            ));
        }

        if let (Some(column), Some(op)) = (self.filter_column.as_deref(), self.filter_op) {
            spec.filter = Some(FilterClause::new(
                column,
                op,
                self.filter_value.clone().unwrap_or_default(),
            ));
        }

        spec
    }
}

/// One page of rows with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsPage {
    /// The rows returned
    pub rows: Vec<Value>,

    /// Column names for rendering; the explicit selection when one was made,
    /// otherwise the union of keys seen in this page
    pub columns: Vec<String>,

    /// Filtered total; `None` means unknown, not zero
    pub total: Option<u64>,

    /// 1-based page number served
    pub page: u64,

    /// Page size served
    pub page_size: u64,

    /// Row offset of the first row in this page
    pub offset: u64,

    /// Whether another page exists; `None` when the total is unknown
    pub has_more: Option<bool>,
}

/// Response for count queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    /// Exact filtered total; `null` when the server reports it as unknown
    pub total: Option<u64>,
}

/// Filter clause as sent by the frontend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl From<FilterRequest> for FilterClause {
    fn from(request: FilterRequest) -> Self {
        FilterClause::new(request.column, request.op, request.value)
    }
}

/// Request body for insert/update/delete
///
/// `values` are raw text fields; type coercion happens server-side so the
/// frontend stays a plain form.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    #[serde(default)]
    pub values: HashMap<String, String>,

    pub filter: Option<FilterRequest>,
}

impl MutationRequest {
    /// Build an INSERT mutation from this request
    pub fn into_insert(self) -> MutationSpec {
        MutationSpec::Insert {
            payload: coerce_payload(&self.values),
        }
    }

    /// Build an UPDATE mutation; requires a filter
    pub fn into_update(self) -> Result<MutationSpec, SourceError> {
        let filter = self
            .filter
            .ok_or(SourceError::UnscopedMutation("update"))?
            .into();
        Ok(MutationSpec::Update {
            payload: coerce_payload(&self.values),
            filter,
        })
    }

    /// Build a DELETE mutation; requires a filter
    pub fn into_delete(self) -> Result<MutationSpec, SourceError> {
        let filter = self
            .filter
            .ok_or(SourceError::UnscopedMutation("delete"))?
            .into();
        Ok(MutationSpec::Delete { filter })
    }
}

/// Response for a successful mutation: the representation PostgREST returned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub rows: Vec<Value>,
    pub affected: usize,
}
