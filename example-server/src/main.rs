use axum::{http::StatusCode, routing::get, Router};
use axum_postgrest_viewer::{Connection, PostgrestViewerLayer};
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,axum_postgrest_viewer=debug".into()),
        )
        .init();

    // Connection settings come from the environment:
    // - POSTGREST_URL or SUPABASE_PROJECT_ID selects the endpoint
    // - POSTGREST_API_KEY is the anon/service key
    // - POSTGREST_BEARER and POSTGREST_SCHEMA are optional overrides
    let api_key = std::env::var("POSTGREST_API_KEY").unwrap_or_default();
    let mut connection = match (
        std::env::var("POSTGREST_URL"),
        std::env::var("SUPABASE_PROJECT_ID"),
    ) {
        (Ok(url), _) => Connection::new(url, api_key),
        (_, Ok(project_id)) => Connection::supabase(&project_id, api_key),
        _ => {
            eprintln!("Set POSTGREST_URL or SUPABASE_PROJECT_ID (plus POSTGREST_API_KEY)");
            std::process::exit(1);
        }
    };
    if let Ok(schema) = std::env::var("POSTGREST_SCHEMA") {
        connection = connection.with_schema(schema);
    }
    if let Ok(bearer) = std::env::var("POSTGREST_BEARER") {
        connection = connection.with_bearer(bearer);
    }

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health_handler))
        .merge(PostgrestViewerLayer::postgrest("/explorer", connection).into_router())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind to port 3000");

    info!("Server running at http://127.0.0.1:3000");
    info!("Explorer available at http://127.0.0.1:3000/explorer");

    axum::serve(listener, app).await.expect("Server error");
}

async fn root_handler() -> &'static str {
    "Welcome to axum-postgrest-viewer example server"
}

async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Server is healthy")
}
