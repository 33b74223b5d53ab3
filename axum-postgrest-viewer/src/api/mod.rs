//! REST API endpoints
//!
//! Handlers for the explorer's own HTTP surface, generic over the
//! [`TableSource`] implementation.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::source::traits::{SourceError, TableSource};

pub mod mutate;
pub mod rows;
pub mod tables;

pub use mutate::{delete_handler, insert_handler, update_handler};
pub use rows::{count_rows_handler, export_csv_handler, get_rows_handler};
pub use tables::{get_columns_handler, list_tables_handler, related_schemas_handler};

/// Create the API router with all endpoints
pub fn create_api_router<S: TableSource>(source: Arc<S>) -> Router {
    // Axum 0.8 uses {param} syntax for path captures
    Router::new()
        .route("/tables", get(tables::list_tables_handler::<S>))
        .route(
            "/tables/{name}/columns",
            get(tables::get_columns_handler::<S>),
        )
        .route(
            "/tables/{name}/schemas",
            get(tables::related_schemas_handler::<S>),
        )
        .route(
            "/tables/{name}/rows",
            get(rows::get_rows_handler::<S>)
                .post(mutate::insert_handler::<S>)
                .patch(mutate::update_handler::<S>)
                .delete(mutate::delete_handler::<S>),
        )
        .route("/tables/{name}/count", get(rows::count_rows_handler::<S>))
        .route("/tables/{name}/export", get(rows::export_csv_handler::<S>))
        .route("/refresh", post(refresh_handler::<S>))
        .with_state(source)
}

/// Handler for POST /api/refresh
///
/// Drops every cached artifact so the next request refetches from upstream.
pub async fn refresh_handler<S: TableSource>(State(source): State<Arc<S>>) -> StatusCode {
    source.invalidate().await;
    StatusCode::NO_CONTENT
}

/// Map a source error onto an HTTP response
///
/// Upstream statuses pass through so the user sees exactly what PostgREST
/// answered; everything that never reached or never parsed the upstream maps
/// to a local status. Known PostgREST failure modes get a `hint` field.
pub fn error_response(error: &SourceError) -> Response {
    let status = match error {
        SourceError::Status { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        SourceError::Http(_)
        | SourceError::Json(_)
        | SourceError::UnexpectedShape(_)
        | SourceError::MissingPaths => StatusCode::BAD_GATEWAY,
        SourceError::NoColumns(_) => StatusCode::NOT_FOUND,
        SourceError::InvalidHeader(_)
        | SourceError::UnscopedMutation(_)
        | SourceError::EmptyPayload
        | SourceError::UnknownOperator(_) => StatusCode::BAD_REQUEST,
    };

    let mut body = serde_json::json!({ "error": error.to_string() });
    if let Some(hint) = error.postgrest_hint() {
        body["hint"] = serde_json::json!(hint);
    }

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_passes_through() {
        let response = error_response(&SourceError::from_status(406, "Not Acceptable".into()));
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    }

    #[test]
    fn test_unscoped_mutation_is_bad_request() {
        let response = error_response(&SourceError::UnscopedMutation("delete"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_columns_is_not_found() {
        let response = error_response(&SourceError::NoColumns("users".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_paths_is_bad_gateway() {
        let response = error_response(&SourceError::MissingPaths);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
