/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A loosely-typed record keyed by field name.
///
/// Rows coming back from the database and partial objects coming in from
/// callers both use this shape; the normalizer is what turns one into the
/// other.
pub type Record = serde_json::Map<String, serde_json::Value>;
