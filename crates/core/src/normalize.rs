//! Field normalization between persisted snake_case columns and camelCase
//! in-memory names.
//!
//! Two independently written groups of callers disagree on naming, so the
//! persistence boundary speaks both:
//!
//! - [`from_row`] (read direction) emits every aliased column under *both*
//!   names with one canonical value, filling documented fallbacks so that
//!   structured fields are never absent.
//! - [`to_columns`] (write direction) folds a partial object written in either
//!   convention down to persisted column names only, serializing structured
//!   JSON fields to text.
//!
//! The two directions treat conflicting input differently. Reads merge
//! permissively: when a row carries both names with different non-null
//! values the snake_case value wins. Writes are strict: the same situation is
//! rejected with [`CoreError::AmbiguousField`], because on the write side it
//! almost always means a caller bug.

use serde_json::Value;

use crate::error::CoreError;
use crate::schema::{Column, ColumnKind, TableSchema};
use crate::types::Record;

// ---------------------------------------------------------------------------
// Read direction
// ---------------------------------------------------------------------------

/// Convert a raw database row into the dual-convention record shape.
///
/// Keys on the row that are not part of the schema (computed columns, joins)
/// are carried over untouched.
pub fn from_row(schema: &TableSchema, mut row: Record) -> Record {
    let mut out = Record::new();

    for column in schema.columns {
        let snake = row.remove(column.name).filter(|v| !v.is_null());
        let camel = column
            .alias
            .and_then(|alias| row.remove(alias))
            .filter(|v| !v.is_null());

        let value = match snake.or(camel) {
            Some(raw) => coerce_read(column, raw),
            None => column.fallback.value(),
        };

        if let Some(alias) = column.alias {
            out.insert(alias.to_string(), value.clone());
        }
        out.insert(column.name.to_string(), value);
    }

    // Whatever is left was not described by the schema.
    for (key, value) in row {
        out.entry(key).or_insert(value);
    }

    out
}

fn coerce_read(column: &Column, raw: Value) -> Value {
    match column.kind {
        ColumnKind::Boolean => Value::Bool(to_bool(&raw)),
        ColumnKind::Json => {
            let parsed = match raw {
                Value::String(text) => serde_json::from_str::<Value>(&text).ok(),
                other => Some(other),
            };
            // Unparseable text or the wrong shape degrades to the fallback.
            match parsed {
                Some(value) if !value.is_null() && column.accepts_json(&value) => value,
                _ => column.fallback.value(),
            }
        }
        _ => raw,
    }
}

/// Explicit boolean conversion for flags that arrive as bools, numbers, or
/// text depending on the driver and the column history.
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "t" | "1" | "yes" | "y" | "on"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Write direction
// ---------------------------------------------------------------------------

/// Fold a caller-supplied partial object into persisted column names.
///
/// - Keys outside the schema are rejected with [`CoreError::UnknownField`].
/// - Read-only columns (`id`, timestamps) are rejected.
/// - When both names for a column are given with different non-null values
///   the call fails with [`CoreError::AmbiguousField`]. Otherwise the
///   snake_case value is preferred, falling back to the camelCase one.
/// - JSON columns given in structured form are serialized to JSON text;
///   strings are passed through as already-serialized JSON.
///
/// The returned record contains only snake_case keys.
pub fn to_columns(schema: &TableSchema, partial: &Record) -> Result<Record, CoreError> {
    for key in partial.keys() {
        match schema.resolve(key) {
            None => {
                return Err(CoreError::UnknownField {
                    table: schema.table,
                    field: key.clone(),
                })
            }
            Some(column) if !column.writable => {
                return Err(CoreError::Validation(format!(
                    "'{key}' is read-only on {}",
                    schema.table
                )))
            }
            Some(_) => {}
        }
    }

    let mut out = Record::new();
    for column in schema.writable_columns() {
        let snake = partial.get(column.name);
        let camel = column.alias.and_then(|alias| partial.get(alias));

        let value = match (snake, camel) {
            (None, None) => continue,
            (Some(s), Some(c)) if !s.is_null() && !c.is_null() && s != c => {
                return Err(CoreError::AmbiguousField {
                    column: column.name,
                    alias: column.alias.unwrap_or(column.name),
                });
            }
            (Some(s), _) if !s.is_null() => s.clone(),
            (_, Some(c)) if !c.is_null() => c.clone(),
            _ => Value::Null,
        };

        out.insert(column.name.to_string(), coerce_write(column, value));
    }

    Ok(out)
}

fn coerce_write(column: &Column, value: Value) -> Value {
    match (column.kind, value) {
        (ColumnKind::Json, v @ (Value::Array(_) | Value::Object(_))) => {
            Value::String(v.to_string())
        }
        (ColumnKind::Boolean, Value::Null) => Value::Null,
        (ColumnKind::Boolean, v) => Value::Bool(to_bool(&v)),
        (_, v) => v,
    }
}
