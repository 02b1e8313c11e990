//! Schema-driven CRUD shared by every repository.
//!
//! Reads return `DbResult` so callers can tell "absent" from "failed".
//! Mutations fold every failure into a [`MutationResult`] and record
//! rejections with the tracker, so nothing escapes the repository edge as
//! an error.

use std::time::Instant;

use serde_json::Value;

use folio_core::error::CoreError;
use folio_core::normalize;
use folio_core::schema::TableSchema;
use folio_core::types::{DbId, Record};

use crate::error::{DbError, DbResult};
use crate::executor::{Database, QueryKind};
use crate::models::mutation::MutationResult;
use crate::statement::{self, Select};

pub(crate) fn validate_id(schema: &TableSchema, id: DbId) -> Result<(), CoreError> {
    if id <= 0 {
        return Err(CoreError::Validation(format!(
            "Invalid {} id: {id}",
            schema.entity
        )));
    }
    Ok(())
}

pub(crate) async fn find_by_id(
    db: &Database,
    schema: &TableSchema,
    id: DbId,
    kind: QueryKind,
) -> DbResult<Option<Record>> {
    validate_id(schema, id)?;
    let operation = format!("{}.get_by_id", schema.table);
    let row = db
        .fetch_optional(&operation, kind, &statement::select_by_id(schema, id))
        .await?;
    Ok(row.map(|row| normalize::from_row(schema, row)))
}

pub(crate) async fn list(
    db: &Database,
    schema: &TableSchema,
    operation: &str,
    kind: QueryKind,
    select: Select<'_>,
) -> DbResult<Vec<Record>> {
    let statement = select.build()?;
    let rows = db.fetch_all(operation, kind, &statement).await?;
    Ok(rows
        .into_iter()
        .map(|row| normalize::from_row(schema, row))
        .collect())
}

pub(crate) async fn create(db: &Database, schema: &TableSchema, partial: &Record) -> MutationResult {
    let operation = format!("{}.create", schema.table);
    let started = Instant::now();

    let statement = match normalize::to_columns(schema, partial)
        .and_then(|columns| statement::insert(schema, &columns))
    {
        Ok(statement) => statement,
        Err(err) => return rejected(db, &operation, started, err),
    };

    match db
        .fetch_optional(&operation, QueryKind::Primary, &statement)
        .await
    {
        Ok(Some(row)) => {
            let id = row.get("id").and_then(Value::as_i64);
            tracing::info!(entity = schema.entity, id, "Created");
            MutationResult::succeeded(id, format!("{} created", schema.entity))
        }
        Ok(None) => MutationResult::failed(format!(
            "Failed to create {}: no id returned",
            schema.entity
        )),
        Err(err) => failed(schema, "create", err),
    }
}

/// Apply a partial update after confirming the row exists.
///
/// Unknown keys, ambiguous dual-named values and empty updates are all
/// rejected before any statement is issued. A missing row is reported as a
/// failure and no `UPDATE` is sent.
pub(crate) async fn update(
    db: &Database,
    schema: &TableSchema,
    id: DbId,
    partial: &Record,
) -> MutationResult {
    let operation = format!("{}.update", schema.table);
    let started = Instant::now();

    let statement = match validate_id(schema, id)
        .and_then(|()| normalize::to_columns(schema, partial))
        .and_then(|columns| statement::update(schema, id, &columns))
    {
        Ok(statement) => statement,
        Err(err) => return rejected(db, &operation, started, err),
    };

    match find_by_id(db, schema, id, QueryKind::Primary).await {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(schema, id),
        Err(err) => return failed(schema, "update", err),
    }

    match db.execute(&operation, &statement).await {
        Ok(0) => not_found(schema, id),
        Ok(_) => {
            tracing::info!(entity = schema.entity, id, "Updated");
            MutationResult::succeeded(Some(id), format!("{} updated", schema.entity))
        }
        Err(err) => failed(schema, "update", err),
    }
}

/// Physically remove a row after confirming it exists.
///
/// The success result echoes the row's `id` and label column.
pub(crate) async fn delete(db: &Database, schema: &TableSchema, id: DbId) -> MutationResult {
    let operation = format!("{}.delete", schema.table);
    let started = Instant::now();

    if let Err(err) = validate_id(schema, id) {
        return rejected(db, &operation, started, err);
    }

    let existing = match find_by_id(db, schema, id, QueryKind::Primary).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return not_found(schema, id),
        Err(err) => return failed(schema, "delete", err),
    };

    match db
        .execute(&operation, &statement::delete_by_id(schema, id))
        .await
    {
        Ok(0) => not_found(schema, id),
        Ok(_) => {
            tracing::info!(entity = schema.entity, id, "Deleted");
            let mut deleted = Record::new();
            deleted.insert("id".into(), Value::from(id));
            deleted.insert(
                schema.label_column.into(),
                existing
                    .get(schema.label_column)
                    .cloned()
                    .unwrap_or(Value::Null),
            );
            MutationResult::succeeded(Some(id), format!("{} deleted", schema.entity))
                .with_deleted(deleted)
        }
        Err(err) => failed(schema, "delete", err),
    }
}

pub(crate) fn rejected(db: &Database, operation: &str, started: Instant, err: CoreError) -> MutationResult {
    let message = err.to_string();
    tracing::warn!(operation, error = %message, "Rejected before execution");
    db.tracker().record(operation, started, false, Some(&message));
    MutationResult::failed(message)
}

pub(crate) fn not_found(schema: &TableSchema, id: DbId) -> MutationResult {
    let err = CoreError::NotFound {
        entity: schema.entity,
        id,
    };
    MutationResult::failed(err.to_string())
}

// The executor has already recorded the failure with the tracker.
fn failed(schema: &TableSchema, action: &str, err: DbError) -> MutationResult {
    tracing::error!(entity = schema.entity, action, error = %err, "Mutation failed");
    MutationResult::failed(format!("Failed to {action} {}: {err}", schema.entity))
}
