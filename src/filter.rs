//! Predicate-based filtering for similarity search.
//!
//! Metadata predicates can be built directly or parsed from a `where`
//! clause in the operator syntax used by Chroma and LangChain:
//!
//! ```rust
//! use vectordb::filter::Predicate;
//! use serde_json::json;
//!
//! let pred = Predicate::from_where(&json!({
//!     "$or": [{"year": 2024}, {"access_level": "Developer"}]
//! })).unwrap();
//! ```

use crate::types::{DatabaseError, Metadata, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;

/// Predicate over document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    // Comparison operations
    /// field == value
    Eq(String, Value),
    /// field != value (true when field is absent)
    Ne(String, Value),
    /// field > value
    Gt(String, Value),
    /// field >= value
    Gte(String, Value),
    /// field < value
    Lt(String, Value),
    /// field <= value
    Lte(String, Value),

    // Set operations
    /// field IN [values]
    In(String, Vec<Value>),
    /// field NOT IN [values] (true when field is absent)
    NotIn(String, Vec<Value>),

    // Logical operations
    /// pred1 AND pred2 AND ...
    And(Vec<Predicate>),
    /// pred1 OR pred2 OR ...
    Or(Vec<Predicate>),
    /// NOT pred
    Not(Box<Predicate>),

    /// Always true
    All,
}

impl Predicate {
    /// Evaluate predicate against document metadata.
    pub fn evaluate(&self, fields: &Metadata) -> bool {
        match self {
            Predicate::Eq(field, value) => {
                fields.get(field).map(|v| values_equal(v, value)).unwrap_or(false)
            }
            Predicate::Ne(field, value) => {
                fields.get(field).map(|v| !values_equal(v, value)).unwrap_or(true)
            }
            Predicate::Gt(field, value) => compare_field(fields, field, value, |o| o == Ordering::Greater),
            Predicate::Gte(field, value) => compare_field(fields, field, value, |o| o != Ordering::Less),
            Predicate::Lt(field, value) => compare_field(fields, field, value, |o| o == Ordering::Less),
            Predicate::Lte(field, value) => compare_field(fields, field, value, |o| o != Ordering::Greater),
            Predicate::In(field, values) => fields
                .get(field)
                .map(|v| values.iter().any(|candidate| values_equal(v, candidate)))
                .unwrap_or(false),
            Predicate::NotIn(field, values) => fields
                .get(field)
                .map(|v| !values.iter().any(|candidate| values_equal(v, candidate)))
                .unwrap_or(true),
            Predicate::And(predicates) => predicates.iter().all(|p| p.evaluate(fields)),
            Predicate::Or(predicates) => predicates.iter().any(|p| p.evaluate(fields)),
            Predicate::Not(predicate) => !predicate.evaluate(fields),
            Predicate::All => true,
        }
    }

    /// Parse a `where` clause.
    ///
    /// Supported forms:
    /// - `{"field": scalar}` (equality)
    /// - `{"field": {"$eq" | "$ne" | "$gt" | "$gte" | "$lt" | "$lte": scalar}}`
    /// - `{"field": {"$in" | "$nin": [scalar, ...]}}`
    /// - `{"$and": [clause, ...]}`, `{"$or": [clause, ...]}`
    ///
    /// Several top-level keys are combined with AND; `{}` matches everything.
    pub fn from_where(clause: &Value) -> Result<Self> {
        let obj = clause
            .as_object()
            .ok_or_else(|| invalid(format!("where clause must be an object, got {}", clause)))?;

        let mut predicates = Vec::with_capacity(obj.len());

        for (key, value) in obj {
            let pred = match key.as_str() {
                "$and" => Predicate::And(parse_clause_list(key, value)?),
                "$or" => Predicate::Or(parse_clause_list(key, value)?),
                op if op.starts_with('$') => {
                    return Err(invalid(format!("unknown logical operator '{}'", op)))
                }
                field => parse_field_condition(field, value)?,
            };
            predicates.push(pred);
        }

        Ok(match predicates.len() {
            0 => Predicate::All,
            1 => predicates.remove(0),
            _ => Predicate::And(predicates),
        })
    }
}

/// Filter over document content (`where_document`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentFilter {
    /// content contains substring
    Contains(String),
    /// content does not contain substring
    NotContains(String),
    And(Vec<DocumentFilter>),
    Or(Vec<DocumentFilter>),
}

impl DocumentFilter {
    /// Evaluate filter against document content.
    pub fn evaluate(&self, content: &str) -> bool {
        match self {
            DocumentFilter::Contains(needle) => content.contains(needle.as_str()),
            DocumentFilter::NotContains(needle) => !content.contains(needle.as_str()),
            DocumentFilter::And(filters) => filters.iter().all(|f| f.evaluate(content)),
            DocumentFilter::Or(filters) => filters.iter().any(|f| f.evaluate(content)),
        }
    }

    /// Parse a `where_document` clause, e.g. `{"$contains": "latency"}`.
    pub fn from_where_document(clause: &Value) -> Result<Self> {
        let obj = clause
            .as_object()
            .filter(|o| o.len() == 1)
            .ok_or_else(|| invalid("where_document must be an object with exactly one operator"))?;

        // Length checked above
        let (op, operand) = obj.iter().next().ok_or_else(|| invalid("empty where_document"))?;

        match op.as_str() {
            "$contains" | "$not_contains" => {
                let text = operand
                    .as_str()
                    .ok_or_else(|| invalid(format!("{} expects a string", op)))?
                    .to_string();
                Ok(if op == "$contains" {
                    DocumentFilter::Contains(text)
                } else {
                    DocumentFilter::NotContains(text)
                })
            }
            "$and" | "$or" => {
                let items = non_empty_array(op, operand)?
                    .iter()
                    .map(DocumentFilter::from_where_document)
                    .collect::<Result<Vec<_>>>()?;
                Ok(if op == "$and" {
                    DocumentFilter::And(items)
                } else {
                    DocumentFilter::Or(items)
                })
            }
            other => Err(invalid(format!("unknown where_document operator '{}'", other))),
        }
    }
}

fn invalid(msg: impl Into<String>) -> DatabaseError {
    DatabaseError::InvalidFilter(msg.into())
}

fn non_empty_array<'a>(op: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    match value.as_array() {
        Some(items) if !items.is_empty() => Ok(items),
        Some(_) => Err(invalid(format!("{} expects a non-empty list", op))),
        None => Err(invalid(format!("{} expects a list, got {}", op, value))),
    }
}

fn parse_clause_list(op: &str, value: &Value) -> Result<Vec<Predicate>> {
    non_empty_array(op, value)?
        .iter()
        .map(Predicate::from_where)
        .collect()
}

fn parse_field_condition(field: &str, condition: &Value) -> Result<Predicate> {
    let field_name = field.to_string();

    let ops = match condition {
        Value::Object(ops) => ops,
        scalar => return Ok(Predicate::Eq(field_name, expect_scalar(field, scalar)?)),
    };

    // {"field": {"$gte": 2020, "$lt": 2025}} is a conjunction
    let mut predicates = Vec::with_capacity(ops.len());
    for (op, operand) in ops {
        let pred = match op.as_str() {
            "$eq" => Predicate::Eq(field_name.clone(), expect_scalar(field, operand)?),
            "$ne" => Predicate::Ne(field_name.clone(), expect_scalar(field, operand)?),
            "$gt" => Predicate::Gt(field_name.clone(), expect_scalar(field, operand)?),
            "$gte" => Predicate::Gte(field_name.clone(), expect_scalar(field, operand)?),
            "$lt" => Predicate::Lt(field_name.clone(), expect_scalar(field, operand)?),
            "$lte" => Predicate::Lte(field_name.clone(), expect_scalar(field, operand)?),
            "$in" | "$nin" => {
                let values = non_empty_array(op, operand)?
                    .iter()
                    .map(|v| expect_scalar(field, v))
                    .collect::<Result<Vec<_>>>()?;
                if op == "$in" {
                    Predicate::In(field_name.clone(), values)
                } else {
                    Predicate::NotIn(field_name.clone(), values)
                }
            }
            other => {
                return Err(invalid(format!(
                    "unknown operator '{}' for field '{}'",
                    other, field
                )))
            }
        };
        predicates.push(pred);
    }

    match predicates.len() {
        0 => Err(invalid(format!("empty condition for field '{}'", field))),
        1 => Ok(predicates.remove(0)),
        _ => Ok(Predicate::And(predicates)),
    }
}

fn expect_scalar(field: &str, value: &Value) -> Result<Value> {
    match value {
        Value::String(_) | Value::Number(_) | Value::Bool(_) => Ok(value.clone()),
        other => Err(invalid(format!(
            "field '{}' must be compared against a string, number or bool, got {}",
            field, other
        ))),
    }
}

/// Equality with integer/float unification (2024 == 2024.0).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Integers compare exactly; f64 only when either side is a float.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return Some(a.cmp(&b));
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return Some(a.cmp(&b));
    }
    if a.is_f64() || b.is_f64() {
        return a.as_f64()?.partial_cmp(&b.as_f64()?);
    }
    // One negative i64, one u64 above i64::MAX
    Some(if a.is_i64() { Ordering::Less } else { Ordering::Greater })
}

/// Ordering between two scalars of the same kind; `None` across kinds.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_field(fields: &Metadata, field: &str, value: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    fields
        .get(field)
        .and_then(|v| compare_values(v, value))
        .map(accept)
        .unwrap_or(false)
}
