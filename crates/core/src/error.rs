use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A row an update or delete targets does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A key that is neither a writable column nor a known alias.
    #[error("Field '{field}' is not writable on {table}")]
    UnknownField { table: &'static str, field: String },

    /// Both naming conventions were supplied with different non-null values.
    #[error("Conflicting values supplied for '{column}' and '{alias}'")]
    AmbiguousField {
        column: &'static str,
        alias: &'static str,
    },

    #[error("Nothing to update")]
    NothingToUpdate,
}

impl CoreError {
    /// Whether this error was raised before any statement reached the database.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_)
                | CoreError::UnknownField { .. }
                | CoreError::AmbiguousField { .. }
                | CoreError::NothingToUpdate
        )
    }
}
