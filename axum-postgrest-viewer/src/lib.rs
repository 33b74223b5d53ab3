//! # axum-postgrest-viewer
//!
//! A development tool for browsing PostgREST-compatible REST APIs (such as a
//! Supabase project) in web browsers, easily integrable as an Axum layer.
//!
//! ## Features
//!
//! - Table discovery from the API's OpenAPI document
//! - Column discovery from OpenAPI schema components and/or live row sampling
//! - Paging, sorting, and single-clause filtering via PostgREST query parameters
//! - Exact row counts via `Prefer: count=exact` and `Content-Range`
//! - Insert/update/delete with `return=representation`
//! - CSV export of the current page
//!
//! ## Security Warning
//!
//! **This is a development tool only!**
//!
//! - Credentials you supply are forwarded on every upstream request
//! - Mutations write through to the connected database
//! - Should never be exposed in production or public networks
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get};
//! use axum_postgrest_viewer::{Connection, PostgrestViewerLayer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let connection = Connection::supabase("xgukkzjwudbxyiohspsv", "anon-key");
//!
//!     let app = Router::new()
//!         .route("/", get(|| async { "Hello, World!" }))
//!         .merge(PostgrestViewerLayer::postgrest("/explorer", connection).into_router());
//!
//!     // Serve the application...
//! }
//! ```

// Public modules
pub mod api;
pub mod coerce;
pub mod connection;
pub mod csv;
pub mod frontend;
pub mod layer;
pub mod openapi;
pub mod query;
pub mod schema;
pub mod source;

// Public exports
pub use connection::Connection;
pub use layer::PostgrestViewerLayer;
pub use query::{FilterClause, FilterOp, MutationSpec, QuerySpec, SortDirection};
pub use schema::{ColumnMode, RowsPage, TableInfo};
pub use source::{PostgrestSource, SourceError, TableSource};

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, SourceError>;
