//! OpenAPI document interpretation
//!
//! PostgREST serves a machine-generated OpenAPI description at the API root.
//! This module contains the pure functions that read table names and column
//! lists out of that document. Nothing here performs I/O; the document arrives
//! as an already-parsed `serde_json::Value`.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

/// Extract queryable table names from an OpenAPI document
///
/// A path key is a table when it starts with `/`, is not an RPC endpoint
/// (`/rpc/...`), and contains no further `/`. Query-string suffixes are
/// stripped before the check. Returns `None` when the document has no `paths`
/// object at all, which is distinct from a well-formed document describing
/// zero tables.
pub fn tables_from_document(document: &Value) -> Option<Vec<String>> {
    let paths = document.get("paths")?.as_object()?;

    let mut names = BTreeSet::new();
    for path in paths.keys() {
        if !path.starts_with('/') || path.starts_with("/rpc/") {
            continue;
        }
        let segment = path
            .split('?')
            .next()
            .unwrap_or("")
            .trim_matches('/');
        if segment.is_empty() || segment.contains('/') {
            continue;
        }
        names.insert(segment.to_string());
    }

    Some(names.into_iter().collect())
}

/// Extract a column list for a table from the document's schema components
///
/// PostgREST versions differ in how they name component schemas, so a fixed
/// list of naming conventions is probed and the properties of every match are
/// unioned:
/// `{schema}_{table}`, `{table}`, `{schema}.{table}`, `{table}_insert`,
/// `{table}_update`.
///
/// Returns `None` when no candidate matched or none of them had properties.
pub fn columns_from_document(document: &Value, schema: &str, table: &str) -> Option<Vec<String>> {
    let components = component_schemas(document)?;

    let candidates = [
        format!("{}_{}", schema, table),
        table.to_string(),
        format!("{}.{}", schema, table),
        format!("{}_insert", table),
        format!("{}_update", table),
    ];

    let mut columns = BTreeSet::new();
    for candidate in &candidates {
        let Some(properties) = components
            .get(candidate)
            .and_then(|definition| definition.get("properties"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        columns.extend(properties.keys().cloned());
    }

    if columns.is_empty() {
        None
    } else {
        Some(columns.into_iter().collect())
    }
}

/// List every component schema whose name mentions the table, with its columns
///
/// Debug aid for when the candidate probing in [`columns_from_document`] comes
/// up empty: shows what the document actually calls this table's schemas.
pub fn related_schemas(document: &Value, table: &str) -> BTreeMap<String, Vec<String>> {
    let mut related = BTreeMap::new();
    let Some(components) = component_schemas(document) else {
        return related;
    };

    let needle = table.to_lowercase();
    for (name, definition) in components {
        if !name.to_lowercase().contains(&needle) {
            continue;
        }
        if let Some(properties) = definition.get("properties").and_then(Value::as_object) {
            related.insert(name.clone(), properties.keys().cloned().collect());
        }
    }

    related
}

/// Infer a column list from sampled rows by unioning their keys
///
/// Known limitation: a sample only reflects columns that were non-null in at
/// least one sampled row, so the result can miss columns the table actually
/// has. Callers surface it as "inferred", never as authoritative.
pub fn columns_from_rows(rows: &[Value]) -> Option<Vec<String>> {
    let mut columns = BTreeSet::new();
    for row in rows {
        if let Some(object) = row.as_object() {
            columns.extend(object.keys().cloned());
        }
    }

    if columns.is_empty() {
        None
    } else {
        Some(columns.into_iter().collect())
    }
}

fn component_schemas(document: &Value) -> Option<&serde_json::Map<String, Value>> {
    // PostgREST emits OpenAPI 3 ("components.schemas") or Swagger 2
    // ("definitions") depending on version.
    document
        .get("components")
        .and_then(|components| components.get("schemas"))
        .and_then(Value::as_object)
        .or_else(|| document.get("definitions").and_then(Value::as_object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "paths": {
                "/": {},
                "/users": {},
                "/orders?select=*": {},
                "/rpc/do_thing": {},
                "/users/{id}": {},
            },
            "components": {
                "schemas": {
                    "users": {
                        "properties": { "id": {}, "name": {} }
                    },
                    "users_insert": {
                        "properties": { "name": {}, "email": {} }
                    },
                    "public_orders": {
                        "properties": { "id": {}, "total": {} }
                    }
                }
            }
        })
    }

    #[test]
    fn test_tables_skip_rpc_and_nested_paths() {
        let tables = tables_from_document(&sample_document()).unwrap();
        assert_eq!(tables, vec!["orders".to_string(), "users".to_string()]);
        for name in &tables {
            assert!(!name.contains('/'));
            assert!(!name.starts_with("rpc/"));
        }
    }

    #[test]
    fn test_missing_paths_is_not_zero_tables() {
        assert!(tables_from_document(&json!({})).is_none());
        assert!(tables_from_document(&json!({"paths": []})).is_none());
        assert_eq!(
            tables_from_document(&json!({"paths": {}})).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_columns_union_all_matching_candidates() {
        let columns = columns_from_document(&sample_document(), "public", "users").unwrap();
        assert_eq!(columns, vec!["email", "id", "name"]);
    }

    #[test]
    fn test_columns_via_schema_prefixed_candidate() {
        let columns = columns_from_document(&sample_document(), "public", "orders").unwrap();
        assert_eq!(columns, vec!["id", "total"]);
    }

    #[test]
    fn test_columns_none_when_no_candidate_matches() {
        assert!(columns_from_document(&sample_document(), "public", "missing").is_none());
    }

    #[test]
    fn test_swagger2_definitions_are_recognized() {
        let document = json!({
            "paths": { "/items": {} },
            "definitions": {
                "items": { "properties": { "sku": {} } }
            }
        });
        let columns = columns_from_document(&document, "public", "items").unwrap();
        assert_eq!(columns, vec!["sku"]);
    }

    #[test]
    fn test_related_schemas_matches_case_insensitively() {
        let related = related_schemas(&sample_document(), "Users");
        assert!(related.contains_key("users"));
        assert!(related.contains_key("users_insert"));
        assert!(!related.contains_key("public_orders"));
    }

    #[test]
    fn test_columns_from_rows_unions_keys() {
        let rows = vec![
            json!({"id": 1, "name": "a"}),
            json!({"id": 2, "email": "b@example.com"}),
            json!("not an object"),
        ];
        let columns = columns_from_rows(&rows).unwrap();
        assert_eq!(columns, vec!["email", "id", "name"]);
    }

    #[test]
    fn test_columns_from_rows_empty_sample() {
        assert!(columns_from_rows(&[]).is_none());
    }
}
