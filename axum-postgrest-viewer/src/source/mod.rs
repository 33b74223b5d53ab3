//! Table sources
//!
//! The trait the handlers depend on, and the PostgREST implementation.

pub mod postgrest;
pub mod traits;

pub use postgrest::PostgrestSource;
pub use traits::{SourceError, TableSource};
