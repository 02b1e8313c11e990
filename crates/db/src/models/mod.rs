//! Typed views over normalized records.
//!
//! Each entity wraps the dual-convention [`Record`] produced by
//! [`folio_core::normalize::from_row`] and serializes as that record
//! unchanged, so callers written against either naming convention keep
//! working. Accessors read the snake_case side.

pub mod mutation;
pub mod project;
pub mod roi;
pub mod team_member;

use serde_json::Value;

use folio_core::types::{DbId, Record};

fn text<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    record.get(key).and_then(Value::as_str)
}

fn int(record: &Record, key: &str) -> Option<i64> {
    record.get(key).and_then(Value::as_i64)
}

fn flag(record: &Record, key: &str) -> bool {
    record.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn id(record: &Record) -> Option<DbId> {
    int(record, "id")
}

/// Every string element of an array field, in order.
fn string_list(record: &Record, key: &str) -> Vec<String> {
    record
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
