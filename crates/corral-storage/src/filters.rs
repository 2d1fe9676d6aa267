//! Translation of `field = value` filter maps into SQL predicates.
//!
//! Column filters compare the record column directly. Payload filters
//! compare `json_extract(payload, '$.field')`. Any other key is rejected
//! with `UnknownFilter` before a query runs.

use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use corral_core::errors::{CorralError, CorralResult, StoreError};
use corral_core::traits::Filters;

use crate::registry::KindSpec;

/// A validated `WHERE` fragment and its positional parameters.
///
/// `sql` starts with `kind = ?1`; each filter appends ` AND ...`.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Validate `filters` against `spec` and build the predicate.
pub fn compile(spec: &KindSpec, filters: &Filters) -> CorralResult<CompiledFilter> {
    let mut sql = String::from("kind = ?1");
    let mut params = vec![SqlValue::Text(spec.kind.clone())];

    // Sort for stable SQL text; filter maps are unordered.
    let mut fields: Vec<&String> = filters.keys().collect();
    fields.sort_unstable();

    for field in fields {
        let value = &filters[field];
        let target = if spec.column_filters().contains(&field.as_str()) {
            field.clone()
        } else if spec.filterable.iter().any(|f| f == field) {
            params.push(SqlValue::Text(format!("$.{field}")));
            format!("json_extract(payload, ?{})", params.len())
        } else {
            return Err(StoreError::UnknownFilter {
                kind: spec.kind.clone(),
                field: field.clone(),
                allowed: spec.allowed_filters(),
            }
            .into());
        };

        match to_sql_value(spec, field, value)? {
            None => sql.push_str(&format!(" AND {target} IS NULL")),
            Some(v) => {
                params.push(v);
                sql.push_str(&format!(" AND {target} = ?{}", params.len()));
            }
        }
    }

    Ok(CompiledFilter { sql, params })
}

fn to_sql_value(spec: &KindSpec, field: &str, value: &Value) -> CorralResult<Option<SqlValue>> {
    let v = match value {
        Value::Null => return Ok(None),
        Value::String(s) => SqlValue::Text(s.clone()),
        // json_extract yields 1/0 for JSON booleans.
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::Array(_) | Value::Object(_) => {
            return Err(CorralError::ValidationError(format!(
                "filter '{field}' on kind {} must be a scalar value",
                spec.kind
            )))
        }
    };
    Ok(Some(v))
}
