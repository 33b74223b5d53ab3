//! CSV export formatting
//!
//! Serializes a fetched row page to comma-separated text with a header row.
//! This is a one-way formatting operation; there is no CSV parser in this
//! crate.

use serde_json::Value;

/// Format a row set as CSV text
///
/// The header row lists the given columns in order; each data row emits the
/// value of each column, or an empty field for nulls and absent keys. Nested
/// arrays and objects are serialized as JSON text inside the field.
pub fn rows_to_csv(columns: &[String], rows: &[Value]) -> String {
    let mut output = String::new();

    let header: Vec<String> = columns.iter().map(|column| escape_field(column)).collect();
    output.push_str(&header.join(","));
    output.push_str("\r\n");

    for row in rows {
        let fields: Vec<String> = columns
            .iter()
            .map(|column| {
                let value = row.get(column).unwrap_or(&Value::Null);
                escape_field(&field_text(value))
            })
            .collect();
        output.push_str(&fields.join(","));
        output.push_str("\r\n");
    }

    output
}

fn field_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_header_and_rows() {
        let csv = rows_to_csv(
            &columns(&["id", "name"]),
            &[json!({"id": 1, "name": "Ada"}), json!({"id": 2, "name": "Grace"})],
        );
        assert_eq!(csv, "id,name\r\n1,Ada\r\n2,Grace\r\n");
    }

    #[test]
    fn test_nulls_and_missing_keys_are_empty_fields() {
        let csv = rows_to_csv(
            &columns(&["id", "email"]),
            &[json!({"id": 1, "email": null}), json!({"id": 2})],
        );
        assert_eq!(csv, "id,email\r\n1,\r\n2,\r\n");
    }

    #[test]
    fn test_quoting() {
        let csv = rows_to_csv(
            &columns(&["note"]),
            &[json!({"note": "a,b"}), json!({"note": "say \"hi\""}), json!({"note": "two\nlines"})],
        );
        assert_eq!(
            csv,
            "note\r\n\"a,b\"\r\n\"say \"\"hi\"\"\"\r\n\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn test_nested_values_serialize_as_json() {
        let csv = rows_to_csv(
            &columns(&["tags"]),
            &[json!({"tags": ["a", "b"]})],
        );
        assert_eq!(csv, "tags\r\n\"[\"\"a\"\",\"\"b\"\"]\"\r\n");
    }

    #[test]
    fn test_empty_row_set_still_has_header() {
        let csv = rows_to_csv(&columns(&["id"]), &[]);
        assert_eq!(csv, "id\r\n");
    }
}
