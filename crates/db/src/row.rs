//! Decoding Postgres rows into loosely-typed records.

use serde_json::{Number, Value};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo};

use folio_core::types::{Record, Timestamp};

/// Convert a row into a [`Record`] keyed by column name.
///
/// Decoding is driven by the Postgres type name. Values that cannot be
/// decoded (including NULLs) become `Value::Null`.
pub fn row_to_record(row: &PgRow) -> Record {
    let mut record = Record::new();

    for (index, column) in row.columns().iter().enumerate() {
        let value = match column.type_info().name() {
            "BOOL" => decode::<bool>(row, index).map(Value::Bool),
            "INT2" => decode::<i16>(row, index).map(Value::from),
            "INT4" => decode::<i32>(row, index).map(Value::from),
            "INT8" => decode::<i64>(row, index).map(Value::from),
            "FLOAT4" => decode::<f32>(row, index)
                .and_then(|f| Number::from_f64(f64::from(f)))
                .map(Value::Number),
            "FLOAT8" => decode::<f64>(row, index)
                .and_then(Number::from_f64)
                .map(Value::Number),
            "JSON" | "JSONB" => decode::<Value>(row, index),
            "TIMESTAMPTZ" => decode::<Timestamp>(row, index).map(|t| Value::String(t.to_rfc3339())),
            "TIMESTAMP" => decode::<chrono::NaiveDateTime>(row, index)
                .map(|t| Value::String(t.to_string())),
            "DATE" => decode::<chrono::NaiveDate>(row, index).map(|d| Value::String(d.to_string())),
            _ => decode::<String>(row, index).map(Value::String),
        };

        record.insert(column.name().to_string(), value.unwrap_or(Value::Null));
    }

    record
}

fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(index).ok().flatten()
}
