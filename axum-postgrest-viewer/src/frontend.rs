//! Frontend asset serving
//!
//! Serves the embedded explorer frontend with proper MIME types and a
//! `<base href>` injection so the page works at any mount point.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use include_dir::{include_dir, Dir};
use std::sync::Arc;

// Embedded at compile time; the dist directory is checked in
static FRONTEND_DIST: Dir = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

/// State for frontend serving (stores base path for routing)
#[derive(Clone)]
pub struct FrontendState {
    pub base_path: Arc<String>,
}

impl FrontendState {
    pub fn new(base_path: String) -> Self {
        Self {
            base_path: Arc::new(base_path),
        }
    }
}

/// Create a router for serving frontend assets
///
/// Serves:
/// - GET / -> index.html with an injected `<base href>` tag
/// - GET /assets/* -> static assets with long-term caching
pub fn create_frontend_router(base_path: String) -> Router {
    let state = FrontendState::new(base_path);

    Router::new()
        .route("/", get(serve_index_page))
        .route("/assets/{*path}", get(serve_static_asset))
        .with_state(state)
}

/// Serve index.html with the mount point injected as `<base href>`
async fn serve_index_page(State(state): State<FrontendState>) -> Response {
    let Some(file) = FRONTEND_DIST.get_file("index.html") else {
        return serve_fallback_page();
    };

    let mut contents = String::from_utf8_lossy(file.contents()).to_string();
    if let Some(head_position) = contents.find("<head>") {
        let insert_position = head_position + "<head>".len();
        let base_tag = format!("\n    <base href=\"{}/\">", state.base_path);
        contents.insert_str(insert_position, &base_tag);
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(contents))
        .unwrap()
}

/// Serve static assets with guessed MIME types and long-term caching
async fn serve_static_asset(Path(path): Path<String>) -> Response {
    let asset_path = format!("assets/{}", path);

    let Some(file) = FRONTEND_DIST.get_file(&asset_path) else {
        return Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from(format!("Asset not found: {}", asset_path)))
            .unwrap();
    };

    let mime_type = mime_guess::from_path(&asset_path)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_type)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(file.contents()))
        .unwrap()
}

/// Shown when the embedded dist is missing index.html
fn serve_fallback_page() -> Response {
    let html = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>axum-postgrest-viewer</title>
</head>
<body>
    <h1>axum-postgrest-viewer</h1>
    <p>The embedded frontend is missing. The REST API is still available:</p>
    <ul>
        <li><code>GET api/tables</code> - list tables (add <code>?counts=true</code> for row counts)</li>
        <li><code>GET api/tables/{name}/columns</code> - discovered columns</li>
        <li><code>GET api/tables/{name}/rows</code> - paged rows with sorting and one filter clause</li>
        <li><code>GET api/tables/{name}/count</code> - exact filtered count</li>
        <li><code>GET api/tables/{name}/export</code> - CSV download</li>
        <li><code>POST/PATCH/DELETE api/tables/{name}/rows</code> - mutations</li>
    </ul>
</body>
</html>
"#;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(html))
        .unwrap()
}
