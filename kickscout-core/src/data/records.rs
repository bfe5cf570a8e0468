//! Convert collaborator JSON records into a Polars DataFrame.
//!
//! Payload rows do not share a fixed schema: keys may be absent on some
//! rows, and the same key can carry integers on one row and floats on the
//! next. Columns are the union of keys in order of first appearance, each
//! typed from the non-null values it holds.

use super::provider::Record;
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

/// Inferred type of one payload column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
    /// Mixed or nested values, kept as JSON text.
    Json,
}

impl ValueKind {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(Self::Bool),
            Value::Number(n) if n.is_i64() => Some(Self::Int),
            Value::Number(_) => Some(Self::Float),
            Value::String(_) => Some(Self::Text),
            Value::Array(_) | Value::Object(_) => Some(Self::Json),
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Json,
        }
    }
}

/// Build a DataFrame from JSON records.
///
/// An empty slice gives an empty frame with no columns. A key whose values
/// are all null becomes a Float64 all-null column.
pub fn records_to_frame(records: &[Record]) -> PolarsResult<DataFrame> {
    let mut seen = HashSet::new();
    let mut keys: Vec<&str> = Vec::new();
    for record in records {
        for key in record.keys() {
            if seen.insert(key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }

    let columns = keys
        .into_iter()
        .map(|key| {
            let values: Vec<Option<&Value>> = records
                .iter()
                .map(|record| record.get(key).filter(|v| !v.is_null()))
                .collect();
            build_column(key, &values)
        })
        .collect::<Vec<_>>();

    DataFrame::new(columns)
}

fn build_column(name: &str, values: &[Option<&Value>]) -> Column {
    let kind = values
        .iter()
        .flatten()
        .filter_map(|v| ValueKind::of(v))
        .reduce(ValueKind::merge);

    match kind {
        None => Column::full_null(name.into(), values.len(), &DataType::Float64),
        Some(ValueKind::Bool) => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.and_then(Value::as_bool))
                .collect::<Vec<_>>(),
        ),
        Some(ValueKind::Int) => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.and_then(Value::as_i64))
                .collect::<Vec<_>>(),
        ),
        Some(ValueKind::Float) => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.and_then(Value::as_f64))
                .collect::<Vec<_>>(),
        ),
        Some(ValueKind::Text) => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.and_then(Value::as_str).map(str::to_owned))
                .collect::<Vec<_>>(),
        ),
        Some(ValueKind::Json) => Column::new(
            name.into(),
            values
                .iter()
                .map(|v| v.map(json_text))
                .collect::<Vec<_>>(),
        ),
    }
}

/// Text form of a value in a mixed column.
///
/// Integral floats print without a fraction so `13.0` reads `"13"`, the
/// same text a float join key gets after its Int64 cast.
fn json_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && is_integral(f) => (f as i64).to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn is_integral(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64
}
