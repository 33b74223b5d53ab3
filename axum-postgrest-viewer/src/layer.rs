//! PostgrestViewerLayer - Main Axum integration layer
//!
//! This module provides the main entry point for integrating
//! axum-postgrest-viewer into an Axum application.

use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::create_api_router;
use crate::connection::Connection;
use crate::frontend::create_frontend_router;
use crate::source::postgrest::PostgrestSource;
use crate::source::traits::TableSource;

/// Main layer for mounting the PostgREST explorer into an Axum application
///
/// # Example
///
/// ```rust,no_run
/// use axum::Router;
/// use axum_postgrest_viewer::{Connection, PostgrestViewerLayer};
///
/// let connection = Connection::supabase("xgukkzjwudbxyiohspsv", "anon-key");
/// let viewer = PostgrestViewerLayer::postgrest("/explorer", connection);
/// let app = Router::new().merge(viewer.into_router());
/// ```
pub struct PostgrestViewerLayer<S: TableSource> {
    base_path: String,
    source: Arc<S>,
}

impl<S: TableSource> PostgrestViewerLayer<S> {
    /// Create a new explorer at the given base path
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the explorer will be mounted (e.g., "/explorer")
    /// * `source` - The table source implementation
    pub fn new(base_path: impl Into<String>, source: S) -> Self {
        Self {
            base_path: base_path.into(),
            source: Arc::new(source),
        }
    }

    /// Convert into an Axum Router that can be merged
    ///
    /// The returned router includes:
    /// - Frontend serving at `{base_path}/`
    /// - API endpoints at `{base_path}/api/*`
    /// - Permissive CORS middleware for development
    pub fn into_router(self) -> Router {
        let api_router = create_api_router(self.source.clone());
        let frontend_router = create_frontend_router(self.base_path.clone());

        Router::new()
            .nest(&format!("{}/api", self.base_path), api_router)
            .nest(&self.base_path, frontend_router)
            .layer(CorsLayer::permissive())
    }
}

impl PostgrestViewerLayer<PostgrestSource> {
    /// Create an explorer for a PostgREST connection
    ///
    /// # Arguments
    ///
    /// * `base_path` - The URL path where the explorer will be mounted
    /// * `connection` - Connection settings for the upstream API
    pub fn postgrest(base_path: impl Into<String>, connection: Connection) -> Self {
        Self::new(base_path, PostgrestSource::new(connection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_builds_a_router() {
        let connection = Connection::new("https://api.example.com/rest/v1", "key");
        let router = PostgrestViewerLayer::postgrest("/explorer", connection).into_router();
        drop(router);
    }
}
