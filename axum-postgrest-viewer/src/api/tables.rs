//! Table listing and column discovery endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::api::error_response;
use crate::schema::{ColumnsQuery, ColumnsResponse, TableListQuery, TablesResponse};
use crate::source::traits::TableSource;

/// Handler for GET /api/tables
///
/// Lists the queryable tables discovered from the upstream OpenAPI document.
///
/// Query parameters:
/// - counts: probe each table for an exact row count (slow on wide schemas)
/// - refresh: refetch the schema document instead of using the cache
pub async fn list_tables_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Query(query): Query<TableListQuery>,
) -> Response {
    match source.list_tables(query.counts, query.refresh).await {
        Ok(tables) => (StatusCode::OK, Json(TablesResponse { tables })).into_response(),
        Err(err) => {
            error!(error = %err, "failed to list tables");
            error_response(&err)
        }
    }
}

/// Handler for GET /api/tables/{name}/columns
///
/// Returns the discovered column list for a table.
///
/// Query parameters:
/// - mode: `openApi`, `sample`, or `combined` (default)
/// - refresh: bypass the per-table column cache
pub async fn get_columns_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Query(query): Query<ColumnsQuery>,
) -> Response {
    match source.table_columns(&table, query.mode, query.refresh).await {
        Ok(columns) => (
            StatusCode::OK,
            Json(ColumnsResponse {
                table,
                columns,
                mode: query.mode,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(table = %table, error = %err, "column discovery failed");
            error_response(&err)
        }
    }
}

/// Handler for GET /api/tables/{name}/schemas
///
/// Debug endpoint: lists every OpenAPI component schema whose name mentions
/// the table, with the columns each declares. Useful when the normal
/// candidate probing finds nothing.
pub async fn related_schemas_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
) -> Response {
    match source.related_schemas(&table).await {
        Ok(schemas) => (StatusCode::OK, Json(schemas)).into_response(),
        Err(err) => {
            error!(table = %table, error = %err, "failed to read schema components");
            error_response(&err)
        }
    }
}
