//! Connection settings for a PostgREST endpoint
//!
//! A [`Connection`] is a plain value holding everything needed to address the
//! upstream API: base URL, schema name, and credentials. It is derived from
//! user input and never persisted.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL};

use crate::source::traits::SourceError;

/// Default JSON accept header for data requests
pub const ACCEPT_JSON: &str = "application/json";

/// Accept header used when fetching the OpenAPI description
pub const ACCEPT_OPENAPI: &str = "application/openapi+json;version=3.0";

/// Connection settings for a PostgREST-compatible API
#[derive(Debug, Clone)]
pub struct Connection {
    /// Base URL of the REST API, e.g. `https://xyz.supabase.co/rest/v1`
    pub base_url: String,

    /// Postgres schema exposed via the `Accept-Profile` header
    pub schema: String,

    /// API key sent in the `apikey` header
    pub api_key: String,

    /// Bearer token; falls back to the API key when empty
    pub bearer: String,
}

impl Connection {
    /// Create a connection from an explicit base URL and API key
    ///
    /// The schema defaults to `public` and the bearer token to the API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            schema: "public".to_string(),
            api_key: api_key.into(),
            bearer: String::new(),
        }
    }

    /// Create a connection for a Supabase project id
    ///
    /// Builds the base URL `https://{project}.supabase.co/rest/v1` the same way
    /// the Supabase dashboard exposes it.
    pub fn supabase(project_id: &str, api_key: impl Into<String>) -> Self {
        Self::new(
            format!("https://{}.supabase.co/rest/v1", project_id.trim()),
            api_key,
        )
    }

    /// Set the schema sent via `Accept-Profile`
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set a bearer token distinct from the API key
    pub fn with_bearer(mut self, bearer: impl Into<String>) -> Self {
        self.bearer = bearer.into();
        self
    }

    /// URL of the OpenAPI document (the API root)
    pub fn root_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// URL of a table endpoint
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), table)
    }

    /// Build the common headers for a request against this connection
    ///
    /// All values are whitespace-trimmed first; PostgREST credentials pasted
    /// from dashboards routinely carry stray newlines that would otherwise
    /// fail header validation.
    pub fn headers(&self, accept: &str) -> Result<HeaderMap, SourceError> {
        let api_key = self.api_key.trim();
        let bearer = if self.bearer.trim().is_empty() {
            api_key
        } else {
            self.bearer.trim()
        };
        let schema = if self.schema.trim().is_empty() {
            "public"
        } else {
            self.schema.trim()
        };

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer))?,
        );
        headers.insert("Accept-Profile", HeaderValue::from_str(schema)?);
        headers.insert(ACCEPT, HeaderValue::from_str(accept)?);
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supabase_url_construction() {
        let connection = Connection::supabase("xgukkzjwudbxyiohspsv", "key");
        assert_eq!(
            connection.base_url,
            "https://xgukkzjwudbxyiohspsv.supabase.co/rest/v1"
        );
        assert_eq!(
            connection.table_url("users"),
            "https://xgukkzjwudbxyiohspsv.supabase.co/rest/v1/users"
        );
        assert_eq!(
            connection.root_url(),
            "https://xgukkzjwudbxyiohspsv.supabase.co/rest/v1/"
        );
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let connection = Connection::new("https://api.example.com/rest/v1/", "key");
        assert_eq!(
            connection.table_url("orders"),
            "https://api.example.com/rest/v1/orders"
        );
    }

    #[test]
    fn test_bearer_falls_back_to_api_key() {
        let connection = Connection::new("https://api.example.com", "  anon-key \n");
        let headers = connection.headers(ACCEPT_JSON).unwrap();
        assert_eq!(headers.get("apikey").unwrap(), "anon-key");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer anon-key");
        assert_eq!(headers.get("Accept-Profile").unwrap(), "public");
    }

    #[test]
    fn test_explicit_bearer_and_schema() {
        let connection = Connection::new("https://api.example.com", "anon")
            .with_bearer("service-role")
            .with_schema("tenants");
        let headers = connection.headers(ACCEPT_JSON).unwrap();
        assert_eq!(headers.get("authorization").unwrap(), "Bearer service-role");
        assert_eq!(headers.get("Accept-Profile").unwrap(), "tenants");
    }

    #[test]
    fn test_invalid_header_value_is_an_error() {
        let connection = Connection::new("https://api.example.com", "key\u{0}with-nul");
        assert!(connection.headers(ACCEPT_JSON).is_err());
    }
}
