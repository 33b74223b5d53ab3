//! Row fetching, counting, and CSV export endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::api::error_response;
use crate::csv::rows_to_csv;
use crate::schema::{CountResponse, RowQuery};
use crate::source::traits::TableSource;

/// Handler for GET /api/tables/{name}/rows
///
/// Fetches one page of rows with pagination, sorting, and a single optional
/// filter clause.
///
/// Query parameters:
/// - page: 1-based page number (default 1)
/// - pageSize: rows per page (default 100, max 1000)
/// - select: comma-separated columns, empty for `*`
/// - sortBy / sortOrder: ordering (`asc` default)
/// - filterColumn / filterOp / filterValue: one PostgREST filter clause
pub async fn get_rows_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Query(query): Query<RowQuery>,
) -> Response {
    let spec = query.to_spec();
    match source.fetch_rows(&table, &spec).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(err) => {
            error!(table = %table, error = %err, "failed to fetch rows");
            error_response(&err)
        }
    }
}

/// Handler for GET /api/tables/{name}/count
///
/// Returns the exact filtered total. `total` is `null` when the server
/// reports it as unknown, which is distinct from a count of zero.
pub async fn count_rows_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Query(query): Query<RowQuery>,
) -> Response {
    let spec = query.to_spec();
    match source.count_rows(&table, &spec).await {
        Ok(total) => (StatusCode::OK, Json(CountResponse { total })).into_response(),
        Err(err) => {
            error!(table = %table, error = %err, "failed to count rows");
            error_response(&err)
        }
    }
}

/// Handler for GET /api/tables/{name}/export
///
/// Serves the current page as a CSV download. Takes the same query
/// parameters as the rows endpoint.
pub async fn export_csv_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Query(query): Query<RowQuery>,
) -> Response {
    let spec = query.to_spec();
    match source.fetch_rows(&table, &spec).await {
        Ok(page) => {
            let csv = rows_to_csv(&page.columns, &page.rows);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}.csv\"", table),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(err) => {
            error!(table = %table, error = %err, "failed to export rows");
            error_response(&err)
        }
    }
}
