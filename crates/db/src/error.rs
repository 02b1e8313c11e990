use std::time::Duration;

use folio_core::error::CoreError;

/// Errors surfaced by the query executor and the statement builder.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Rejected before any statement was issued.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The database (or the client) reported a failure.
    #[error("Database error: {0}")]
    Query(#[from] sqlx::Error),

    /// The query did not finish before its deadline.
    #[error("Query timeout: {operation} exceeded {after:?}")]
    Timeout {
        operation: String,
        after: Duration,
    },

    #[error("Migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Convenience alias for executor and repository results.
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Connectivity problems and execution failures may succeed on a later
    /// attempt; validation failures never will.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Timeout { .. } | DbError::Query(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DbError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_is_distinct_from_database_error() {
        let err = DbError::Timeout {
            operation: "projects.get_by_id".into(),
            after: Duration::from_secs(15),
        };
        assert_eq!(
            err.to_string(),
            "Query timeout: projects.get_by_id exceeded 15s"
        );
        assert!(err.is_retryable());
        assert!(err.is_timeout());
    }

    #[test]
    fn validation_is_not_retryable() {
        let err = DbError::from(CoreError::NothingToUpdate);
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Nothing to update");
    }

    #[test]
    fn pool_timeout_is_retryable() {
        assert!(DbError::from(sqlx::Error::PoolTimedOut).is_retryable());
    }
}
