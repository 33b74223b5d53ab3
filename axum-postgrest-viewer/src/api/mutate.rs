//! Insert, update, and delete endpoints
//!
//! Mutations always request `return=representation` upstream, so a success
//! response carries the affected rows. UPDATE and DELETE are rejected here,
//! before any request is sent, when no usable filter clause is supplied.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::error;

use crate::api::error_response;
use crate::query::MutationSpec;
use crate::schema::{MutationRequest, MutationResponse};
use crate::source::traits::{SourceError, TableSource};

/// Handler for POST /api/tables/{name}/rows
///
/// Inserts one row. Request body:
/// ```json
/// { "values": { "name": "Ada", "age": "36", "active": "true" } }
/// ```
/// Values are text and coerced server-side (bool, then integer, then float,
/// then string); blank fields are skipped.
pub async fn insert_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Json(request): Json<MutationRequest>,
) -> Response {
    run_mutation(source, &table, Ok(request.into_insert())).await
}

/// Handler for PATCH /api/tables/{name}/rows
///
/// Updates the rows matched by the filter. Request body:
/// ```json
/// {
///   "values": { "status": "archived" },
///   "filter": { "column": "id", "op": "eq", "value": "42" }
/// }
/// ```
pub async fn update_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Json(request): Json<MutationRequest>,
) -> Response {
    run_mutation(source, &table, request.into_update()).await
}

/// Handler for DELETE /api/tables/{name}/rows
///
/// Deletes the rows matched by the filter. Request body:
/// ```json
/// { "filter": { "column": "id", "op": "eq", "value": "42" } }
/// ```
pub async fn delete_handler<S: TableSource>(
    State(source): State<Arc<S>>,
    Path(table): Path<String>,
    Json(request): Json<MutationRequest>,
) -> Response {
    run_mutation(source, &table, request.into_delete()).await
}

async fn run_mutation<S: TableSource>(
    source: Arc<S>,
    table: &str,
    mutation: Result<MutationSpec, SourceError>,
) -> Response {
    let mutation = match mutation {
        Ok(mutation) => mutation,
        Err(err) => return error_response(&err),
    };

    match source.mutate(table, &mutation).await {
        Ok(rows) => {
            let affected = rows.len();
            (StatusCode::OK, Json(MutationResponse { rows, affected })).into_response()
        }
        Err(err) => {
            error!(table = %table, error = %err, "mutation failed");
            error_response(&err)
        }
    }
}
