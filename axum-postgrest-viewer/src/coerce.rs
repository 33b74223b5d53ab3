//! Heuristic text → JSON scalar coercion
//!
//! Mutation values arrive as plain text from form fields, but PostgREST wants
//! typed JSON. The coercion here is heuristic and strictly ordered: boolean,
//! then integer, then float, then string. The precedence is observable
//! (`"007"` becomes the integer 7, never the string `"007"`), so it lives in
//! one pure function with its own tests rather than being inlined at each
//! call site.

use std::collections::HashMap;

use serde_json::{Map, Number, Value};

/// Coerce one text value to a JSON scalar
///
/// Precedence, in order:
/// 1. `"true"` / `"false"` (case-insensitive) → boolean
/// 2. ASCII digits only → integer (i64; wider digit strings fall through)
/// 3. digits plus at least one `.`, parseable as f64 → float
/// 4. anything else → string
///
/// Numbers with a sign (`-5`) are deliberately left as strings; the digit
/// check matches exactly what it says. Callers that need a different type for
/// a text-typed column (e.g. keep `"10"` as a string) must not route the
/// value through this function.
pub fn coerce_scalar(input: &str) -> Value {
    if input.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if input.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    let is_digits = !input.is_empty() && input.bytes().all(|byte| byte.is_ascii_digit());
    if is_digits {
        if let Ok(integer) = input.parse::<i64>() {
            return Value::Number(integer.into());
        }
        // falls through for digit strings beyond i64 range
    }

    let without_dots: String = input.chars().filter(|character| *character != '.').collect();
    let decimal_shaped = !without_dots.is_empty()
        && without_dots.bytes().all(|byte| byte.is_ascii_digit())
        && input.contains('.');
    if is_digits || decimal_shaped {
        if let Some(number) = input.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(number);
        }
    }

    Value::String(input.to_string())
}

/// Build a typed mutation payload from text form fields
///
/// Blank values are skipped entirely rather than sent as empty strings, so a
/// half-filled form only touches the filled-in columns.
pub fn coerce_payload(fields: &HashMap<String, String>) -> Map<String, Value> {
    let mut payload = Map::new();
    for (column, value) in fields {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        payload.insert(column.clone(), coerce_scalar(trimmed));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_booleans() {
        assert_eq!(coerce_scalar("true"), json!(true));
        assert_eq!(coerce_scalar("False"), json!(false));
        assert_eq!(coerce_scalar("TRUE"), json!(true));
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce_scalar("42"), json!(42));
        assert_eq!(coerce_scalar("0"), json!(0));
    }

    #[test]
    fn test_integer_check_precedes_float() {
        // "007" is digits-only, so the integer branch wins
        assert_eq!(coerce_scalar("007"), json!(7));
    }

    #[test]
    fn test_floats() {
        assert_eq!(coerce_scalar("3.14"), json!(3.14));
        assert_eq!(coerce_scalar("0.5"), json!(0.5));
    }

    #[test]
    fn test_strings() {
        assert_eq!(coerce_scalar("hello"), json!("hello"));
        assert_eq!(coerce_scalar(""), json!(""));
        // signed numbers are not digit-only and stay strings
        assert_eq!(coerce_scalar("-5"), json!("-5"));
        // multiple dots pass the digit shape but not the f64 parse
        assert_eq!(coerce_scalar("1.2.3"), json!("1.2.3"));
        // a lone dot has no digits at all
        assert_eq!(coerce_scalar("."), json!("."));
    }

    #[test]
    fn test_oversized_digit_strings_fall_through_to_float() {
        let coerced = coerce_scalar("99999999999999999999");
        assert!(coerced.is_f64());
    }

    #[test]
    fn test_payload_skips_blank_fields() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "Ada".to_string());
        fields.insert("age".to_string(), " 36 ".to_string());
        fields.insert("notes".to_string(), "   ".to_string());

        let payload = coerce_payload(&fields);
        assert_eq!(payload.get("name"), Some(&json!("Ada")));
        assert_eq!(payload.get("age"), Some(&json!(36)));
        assert!(!payload.contains_key("notes"));
    }
}
