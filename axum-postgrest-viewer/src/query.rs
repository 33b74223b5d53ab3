//! PostgREST query and mutation building
//!
//! This module maps structured selections (columns, ordering, one filter
//! clause, pagination) onto PostgREST wire semantics: the query-string
//! parameters sent with every request, and the `Content-Range` header that
//! comes back on counted requests. Everything here is pure; the actual HTTP
//! traffic lives in [`crate::source::postgrest`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::traits::SourceError;

/// Sort direction, spelled the way PostgREST expects it in `order=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// PostgREST filter operators supported by the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
    Cs,
    Cd,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
            FilterOp::Is => "is",
            FilterOp::In => "in",
            FilterOp::Cs => "cs",
            FilterOp::Cd => "cd",
        }
    }
}

impl FromStr for FilterOp {
    type Err = SourceError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_ascii_lowercase().as_str() {
            "eq" => Ok(FilterOp::Eq),
            "neq" => Ok(FilterOp::Neq),
            "gt" => Ok(FilterOp::Gt),
            "gte" => Ok(FilterOp::Gte),
            "lt" => Ok(FilterOp::Lt),
            "lte" => Ok(FilterOp::Lte),
            "like" => Ok(FilterOp::Like),
            "ilike" => Ok(FilterOp::Ilike),
            "is" => Ok(FilterOp::Is),
            "in" => Ok(FilterOp::In),
            "cs" => Ok(FilterOp::Cs),
            "cd" => Ok(FilterOp::Cd),
            other => Err(SourceError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A single filter clause: `<column>=<op>.<value>` on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl FilterClause {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Whether this clause should be sent at all
    ///
    /// `is` works with an empty value (`is.null` is typed as op `is`, value
    /// `null`, but an empty value still targets the operator); every other
    /// operator needs a non-blank value and column.
    pub fn is_active(&self) -> bool {
        !self.column.trim().is_empty()
            && (self.op == FilterOp::Is || !self.value.trim().is_empty())
    }

    /// Whether this clause may scope a mutation
    ///
    /// Stricter than [`Self::is_active`]: mutations always need both a column
    /// and a value, `is` included.
    pub fn scopes_mutation(&self) -> bool {
        !self.column.trim().is_empty() && !self.value.trim().is_empty()
    }

    /// The wire value, `<op>.<value>`
    ///
    /// The `in` operator requires a parenthesized list; the wrapping is
    /// idempotent so already-wrapped input passes through unchanged.
    pub fn wire_value(&self) -> String {
        let trimmed = self.value.trim();
        if self.op == FilterOp::In && !(trimmed.starts_with('(') && trimmed.ends_with(')')) {
            format!("{}.({})", self.op, trimmed)
        } else {
            format!("{}.{}", self.op, trimmed)
        }
    }
}

/// A structured single-table read query
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Selected columns; empty means `*`
    pub select: Vec<String>,

    /// Page size (`limit`)
    pub page_size: u64,

    /// 1-based page number
    pub page: u64,

    /// Optional ordering
    pub order: Option<(String, SortDirection)>,

    /// At most one filter clause
    pub filter: Option<FilterClause>,
}

impl QuerySpec {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            select: Vec::new(),
            page_size,
            page,
            order: None,
            filter: None,
        }
    }

    pub fn limit(&self) -> u64 {
        self.page_size.max(1)
    }

    /// `offset = (page - 1) * limit`, page clamped to 1-based
    ///
    /// Saturates instead of overflowing; `page` comes straight from the
    /// query string.
    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// The `select` parameter value
    pub fn select_value(&self) -> String {
        let columns: Vec<&str> = self
            .select
            .iter()
            .map(|column| column.trim())
            .filter(|column| !column.is_empty())
            .collect();
        if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        }
    }

    /// Build the full PostgREST parameter set for this query
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), self.select_value()),
            ("limit".to_string(), self.limit().to_string()),
            ("offset".to_string(), self.offset().to_string()),
        ];

        if let Some((column, direction)) = &self.order {
            if !column.trim().is_empty() {
                params.push((
                    "order".to_string(),
                    format!("{}.{}", column.trim(), direction.as_str()),
                ));
            }
        }

        if let Some(filter) = &self.filter {
            if filter.is_active() {
                params.push((filter.column.trim().to_string(), filter.wire_value()));
            }
        }

        params
    }

    /// Parameters for a count probe: same filters, but `limit=1`
    ///
    /// Sent together with `Prefer: count=exact` so the response carries a
    /// `Content-Range` total without transferring the page.
    pub fn count_params(&self) -> Vec<(String, String)> {
        let mut params = self.params();
        for (key, value) in &mut params {
            if key == "limit" {
                *value = "1".to_string();
            }
        }
        params
    }
}

/// A structured write against a single table
#[derive(Debug, Clone)]
pub enum MutationSpec {
    /// Insert one row from a column → value payload
    Insert { payload: Map<String, Value> },

    /// Update the rows matched by `filter` with `payload`
    Update {
        payload: Map<String, Value>,
        filter: FilterClause,
    },

    /// Delete the rows matched by `filter`
    Delete { filter: FilterClause },
}

impl MutationSpec {
    /// Reject unscoped or empty mutations before any request is sent
    ///
    /// UPDATE and DELETE must carry a filter with a non-empty column and
    /// value; an unfiltered write would touch every row in the table.
    pub fn validate(&self) -> Result<(), SourceError> {
        match self {
            MutationSpec::Insert { payload } => {
                if payload.is_empty() {
                    return Err(SourceError::EmptyPayload);
                }
            }
            MutationSpec::Update { payload, filter } => {
                if payload.is_empty() {
                    return Err(SourceError::EmptyPayload);
                }
                if !filter.scopes_mutation() {
                    return Err(SourceError::UnscopedMutation("update"));
                }
            }
            MutationSpec::Delete { filter } => {
                if !filter.scopes_mutation() {
                    return Err(SourceError::UnscopedMutation("delete"));
                }
            }
        }
        Ok(())
    }

    /// Filter parameters for the request, if this mutation carries a filter
    pub fn filter_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        let filter = match self {
            MutationSpec::Insert { .. } => None,
            MutationSpec::Update { filter, .. } | MutationSpec::Delete { filter } => Some(filter),
        };
        if let Some(filter) = filter {
            params.insert(filter.column.trim().to_string(), filter.wire_value());
        }
        params
    }
}

/// Parse the total out of a `Content-Range` header
///
/// PostgREST reports `"<range>/<total>"`, e.g. `0-9/42`. Returns `None` for
/// the unknown marker `*`, or when the header is malformed; callers must not
/// conflate that with a count of zero.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let total_part = header.rsplit('/').next()?;
    if total_part == "*" {
        return None;
    }
    total_part.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset_derivation() {
        assert_eq!(QuerySpec::new(1, 100).offset(), 0);
        assert_eq!(QuerySpec::new(2, 100).offset(), 100);
        assert_eq!(QuerySpec::new(7, 25).offset(), 150);
        // page 0 is treated as page 1
        assert_eq!(QuerySpec::new(0, 50).offset(), 0);
    }

    #[test]
    fn test_offset_saturates_for_huge_page_numbers() {
        // page comes straight from the query string; an absurd value must
        // saturate, not overflow
        assert_eq!(QuerySpec::new(u64::MAX, 1000).offset(), u64::MAX);
        assert_eq!(QuerySpec::new(u64::MAX, 1).offset(), u64::MAX - 1);
    }

    #[test]
    fn test_select_defaults_to_star() {
        let mut spec = QuerySpec::new(1, 10);
        assert_eq!(spec.select_value(), "*");

        spec.select = vec!["id".to_string(), " name ".to_string(), String::new()];
        assert_eq!(spec.select_value(), "id,name");
    }

    #[test]
    fn test_full_parameter_set() {
        let mut spec = QuerySpec::new(3, 50);
        spec.select = vec!["id".to_string(), "name".to_string()];
        spec.order = Some(("created_at".to_string(), SortDirection::Desc));
        spec.filter = Some(FilterClause::new("status", FilterOp::Eq, "active"));

        let params = spec.params();
        assert!(params.contains(&("select".to_string(), "id,name".to_string())));
        assert!(params.contains(&("limit".to_string(), "50".to_string())));
        assert!(params.contains(&("offset".to_string(), "100".to_string())));
        assert!(params.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(params.contains(&("status".to_string(), "eq.active".to_string())));
    }

    #[test]
    fn test_count_params_pin_limit_to_one() {
        let mut spec = QuerySpec::new(4, 200);
        spec.filter = Some(FilterClause::new("total", FilterOp::Gt, "10"));

        let params = spec.count_params();
        assert!(params.contains(&("limit".to_string(), "1".to_string())));
        // filters survive so the count matches the page the user sees
        assert!(params.contains(&("total".to_string(), "gt.10".to_string())));
    }

    #[test]
    fn test_in_operator_wrapping_is_idempotent() {
        let clause = FilterClause::new("id", FilterOp::In, "a,b,c");
        assert_eq!(clause.wire_value(), "in.(a,b,c)");

        let wrapped = FilterClause::new("id", FilterOp::In, "(a,b,c)");
        assert_eq!(wrapped.wire_value(), "in.(a,b,c)");
    }

    #[test]
    fn test_is_operator_is_active_with_empty_value() {
        let clause = FilterClause::new("deleted_at", FilterOp::Is, "");
        assert!(clause.is_active());

        let clause = FilterClause::new("deleted_at", FilterOp::Eq, "  ");
        assert!(!clause.is_active());

        let clause = FilterClause::new("", FilterOp::Eq, "value");
        assert!(!clause.is_active());
    }

    #[test]
    fn test_inactive_filter_is_not_sent() {
        let mut spec = QuerySpec::new(1, 10);
        spec.filter = Some(FilterClause::new("name", FilterOp::Eq, ""));
        let params = spec.params();
        assert!(params.iter().all(|(key, _)| key != "name"));
    }

    #[test]
    fn test_unscoped_update_is_rejected() {
        let mut payload = Map::new();
        payload.insert("name".to_string(), json!("renamed"));

        let mutation = MutationSpec::Update {
            payload: payload.clone(),
            filter: FilterClause::new("", FilterOp::Eq, "x"),
        };
        assert!(matches!(
            mutation.validate(),
            Err(SourceError::UnscopedMutation("update"))
        ));

        let mutation = MutationSpec::Update {
            payload,
            filter: FilterClause::new("id", FilterOp::Eq, ""),
        };
        assert!(mutation.validate().is_err());
    }

    #[test]
    fn test_unscoped_delete_is_rejected() {
        let mutation = MutationSpec::Delete {
            filter: FilterClause::new("id", FilterOp::Eq, "  "),
        };
        assert!(matches!(
            mutation.validate(),
            Err(SourceError::UnscopedMutation("delete"))
        ));
    }

    #[test]
    fn test_scoped_mutation_passes_validation() {
        let mutation = MutationSpec::Delete {
            filter: FilterClause::new("id", FilterOp::Eq, "42"),
        };
        assert!(mutation.validate().is_ok());
        assert_eq!(
            mutation.filter_params().get("id"),
            Some(&"eq.42".to_string())
        );
    }

    #[test]
    fn test_empty_insert_payload_is_rejected() {
        let mutation = MutationSpec::Insert {
            payload: Map::new(),
        };
        assert!(matches!(mutation.validate(), Err(SourceError::EmptyPayload)));
    }

    #[test]
    fn test_content_range_with_total() {
        assert_eq!(parse_content_range("0-9/42"), Some(42));
        assert_eq!(parse_content_range("*/0"), Some(0));
    }

    #[test]
    fn test_content_range_unknown_total() {
        assert_eq!(parse_content_range("0-9/*"), None);
    }

    #[test]
    fn test_content_range_malformed() {
        assert_eq!(parse_content_range(""), None);
        assert_eq!(parse_content_range("garbage"), None);
        assert_eq!(parse_content_range("0-9/not-a-number"), None);
    }

    #[test]
    fn test_filter_op_round_trip() {
        for op in [
            FilterOp::Eq,
            FilterOp::Neq,
            FilterOp::Gt,
            FilterOp::Gte,
            FilterOp::Lt,
            FilterOp::Lte,
            FilterOp::Like,
            FilterOp::Ilike,
            FilterOp::Is,
            FilterOp::In,
            FilterOp::Cs,
            FilterOp::Cd,
        ] {
            assert_eq!(op.as_str().parse::<FilterOp>().unwrap(), op);
        }
        assert!("between".parse::<FilterOp>().is_err());
    }
}
