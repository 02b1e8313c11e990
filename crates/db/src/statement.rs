//! Parameterized statement construction.
//!
//! Every value travels as a bound parameter. The only identifiers that reach
//! SQL text are table and column names taken from the static schema in
//! [`folio_core::schema`]; a key that is not found there is rejected, never
//! interpolated.

use serde_json::Value;

use folio_core::error::CoreError;
use folio_core::schema::{Column, ColumnKind, Fallback, TableSchema};
use folio_core::types::{DbId, Record};

/// A typed, nullable bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(Option<String>),
    Int(Option<i64>),
    Bool(Option<bool>),
    /// JSON text, cast to `jsonb` at its placeholder.
    Json(Option<String>),
}

impl SqlParam {
    fn placeholder(&self, position: usize) -> String {
        match self {
            SqlParam::Json(_) => format!("${position}::jsonb"),
            _ => format!("${position}"),
        }
    }
}

impl From<DbId> for SqlParam {
    fn from(value: DbId) -> Self {
        SqlParam::Int(Some(value))
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Bool(Some(value))
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(Some(value.to_string()))
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(Some(value))
    }
}

/// SQL text plus its positional parameters (`$1` is `params[0]`).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, param: impl Into<SqlParam>) -> Self {
        self.params.push(param.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Value coercion
// ---------------------------------------------------------------------------

/// Convert a JSON value into the bind parameter type `column` is stored as.
pub fn param_for(column: &Column, value: &Value) -> Result<SqlParam, CoreError> {
    let mismatch = || {
        CoreError::Validation(format!(
            "'{}' expects {:?}, got {value}",
            column.name, column.kind
        ))
    };

    match column.kind {
        ColumnKind::Text => match value {
            Value::Null => Ok(SqlParam::Text(None)),
            Value::String(s) => Ok(SqlParam::Text(Some(s.clone()))),
            Value::Number(n) => Ok(SqlParam::Text(Some(n.to_string()))),
            Value::Bool(b) => Ok(SqlParam::Text(Some(b.to_string()))),
            Value::Array(_) | Value::Object(_) => Err(mismatch()),
        },
        ColumnKind::Integer => match value {
            Value::Null => Ok(SqlParam::Int(None)),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(|i| SqlParam::Int(Some(i)))
                .ok_or_else(mismatch),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| SqlParam::Int(Some(i)))
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        },
        ColumnKind::Boolean => match value {
            Value::Null => Ok(SqlParam::Bool(None)),
            Value::Bool(b) => Ok(SqlParam::Bool(Some(*b))),
            _ => Err(mismatch()),
        },
        ColumnKind::Json => {
            let (parsed, text) = match value {
                Value::Null => return Ok(SqlParam::Json(None)),
                Value::String(text) => {
                    let parsed = serde_json::from_str::<Value>(text).map_err(|_| {
                        CoreError::Validation(format!("'{}' is not valid JSON text", column.name))
                    })?;
                    (parsed, text.clone())
                }
                other => (other.clone(), other.to_string()),
            };
            if !column.accepts_json(&parsed) {
                return Err(CoreError::Validation(format!(
                    "'{}' expects a JSON {}, got {parsed}",
                    column.name,
                    if column.fallback == Fallback::EmptyObject {
                        "object"
                    } else {
                        "array"
                    }
                )));
            }
            Ok(SqlParam::Json(Some(text)))
        }
        ColumnKind::Timestamp => Err(CoreError::Validation(format!(
            "'{}' is maintained by the database",
            column.name
        ))),
    }
}

/// Pair every key of a canonicalized record with its schema column, in
/// schema declaration order.
fn checked_columns<'r>(
    schema: &TableSchema,
    columns: &'r Record,
) -> Result<Vec<(&'static Column, &'r Value)>, CoreError> {
    if let Some(key) = columns
        .keys()
        .find(|key| !schema.column(key).is_some_and(|c| c.writable))
    {
        return Err(CoreError::UnknownField {
            table: schema.table,
            field: key.clone(),
        });
    }

    Ok(schema
        .writable_columns()
        .filter_map(|column| columns.get(column.name).map(|value| (column, value)))
        .collect())
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Build `INSERT ... RETURNING id` from a canonicalized record.
pub fn insert(schema: &TableSchema, columns: &Record) -> Result<Statement, CoreError> {
    let pairs = checked_columns(schema, columns)?;
    if pairs.is_empty() {
        return Err(CoreError::Validation(format!(
            "No fields supplied for new {}",
            schema.entity
        )));
    }

    let mut names = Vec::with_capacity(pairs.len());
    let mut placeholders = Vec::with_capacity(pairs.len());
    let mut params = Vec::with_capacity(pairs.len());
    for (position, (column, value)) in pairs.into_iter().enumerate() {
        let param = param_for(column, value)?;
        names.push(column.name);
        placeholders.push(param.placeholder(position + 1));
        params.push(param);
    }

    Ok(Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            schema.table,
            names.join(", "),
            placeholders.join(", ")
        ),
        params,
    })
}

/// Build `UPDATE ... SET` covering exactly the keys of a canonicalized record.
///
/// `last_updated` is always touched and the id is bound last. An empty
/// record yields [`CoreError::NothingToUpdate`] instead of a no-op statement.
pub fn update(schema: &TableSchema, id: DbId, columns: &Record) -> Result<Statement, CoreError> {
    let pairs = checked_columns(schema, columns)?;
    if pairs.is_empty() {
        return Err(CoreError::NothingToUpdate);
    }

    let mut assignments = Vec::with_capacity(pairs.len() + 1);
    let mut params = Vec::with_capacity(pairs.len() + 1);
    for (position, (column, value)) in pairs.into_iter().enumerate() {
        let param = param_for(column, value)?;
        assignments.push(format!("{} = {}", column.name, param.placeholder(position + 1)));
        params.push(param);
    }
    assignments.push("last_updated = NOW()".to_string());
    params.push(SqlParam::from(id));

    Ok(Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE id = ${}",
            schema.table,
            assignments.join(", "),
            params.len()
        ),
        params,
    })
}

pub fn delete_by_id(schema: &TableSchema, id: DbId) -> Statement {
    Statement::new(format!("DELETE FROM {} WHERE id = $1", schema.table)).bind(id)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

pub fn select_by_id(schema: &TableSchema, id: DbId) -> Statement {
    Statement::new(format!("SELECT * FROM {} WHERE id = $1", schema.table)).bind(id)
}

/// Allow-listed `SELECT *` builder.
///
/// Column names are checked against the schema as they are added; the first
/// unknown name is reported by [`Select::build`].
pub struct Select<'s> {
    schema: &'s TableSchema,
    conditions: Vec<String>,
    params: Vec<SqlParam>,
    order: Vec<String>,
    limit: Option<i64>,
    error: Option<CoreError>,
}

impl<'s> Select<'s> {
    pub fn table(schema: &'s TableSchema) -> Self {
        Self {
            schema,
            conditions: Vec::new(),
            params: Vec::new(),
            order: Vec::new(),
            limit: None,
            error: None,
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<SqlParam>) -> Self {
        if let Some(name) = self.check(column) {
            let param = value.into();
            let placeholder = param.placeholder(self.params.len() + 1);
            self.conditions.push(format!("{name} = {placeholder}"));
            self.params.push(param);
        }
        self
    }

    /// `column LIKE 'prefix%'`, with LIKE wildcards in `prefix` escaped.
    pub fn starts_with(mut self, column: &str, prefix: &str) -> Self {
        if let Some(name) = self.check(column) {
            self.params
                .push(SqlParam::Text(Some(format!("{}%", escape_like(prefix)))));
            self.conditions
                .push(format!("{name} LIKE ${}", self.params.len()));
        }
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        if let Some(name) = self.check(column) {
            self.order.push(format!("{name} ASC"));
        }
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        if let Some(name) = self.check(column) {
            self.order.push(format!("{name} DESC"));
        }
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Statement, CoreError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut sql = format!("SELECT * FROM {}", self.schema.table);
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order.join(", "));
        }
        let mut params = self.params;
        if let Some(limit) = self.limit {
            params.push(SqlParam::from(limit));
            sql.push_str(&format!(" LIMIT ${}", params.len()));
        }

        Ok(Statement { sql, params })
    }

    fn check(&mut self, column: &str) -> Option<&'static str> {
        match self.schema.column(column) {
            Some(c) => Some(c.name),
            None => {
                self.error.get_or_insert(CoreError::UnknownField {
                    table: self.schema.table,
                    field: column.to_string(),
                });
                None
            }
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use folio_core::normalize::to_columns;
    use folio_core::schema::{PROJECTS, TEAM_MEMBERS};

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn placeholder_count(sql: &str) -> usize {
        sql.matches('$').count()
    }

    #[test]
    fn insert_derives_columns_from_record_keys() {
        let columns = to_columns(
            &PROJECTS,
            &record(json!({"title": "Demo", "technologies": ["Go", "Postgres"], "image": "/x.png"})),
        )
        .unwrap();
        let stmt = insert(&PROJECTS, &columns).unwrap();

        assert_eq!(
            stmt.sql,
            "INSERT INTO projects (title, image_url, technologies) \
             VALUES ($1, $2, $3::jsonb) RETURNING id"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlParam::Text(Some("Demo".into())),
                SqlParam::Text(Some("/x.png".into())),
                SqlParam::Json(Some("[\"Go\",\"Postgres\"]".into())),
            ]
        );
    }

    #[test]
    fn update_sets_present_keys_touches_timestamp_and_binds_id_last() {
        let columns = record(json!({"featured": true, "progress": 80}));
        let stmt = update(&PROJECTS, 42, &columns).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE projects SET progress = $1, featured = $2, last_updated = NOW() WHERE id = $3"
        );
        assert_eq!(
            stmt.params,
            vec![
                SqlParam::Int(Some(80)),
                SqlParam::Bool(Some(true)),
                SqlParam::Int(Some(42)),
            ]
        );
        assert_eq!(placeholder_count(&stmt.sql), stmt.params.len());
    }

    #[test]
    fn empty_update_is_reported_not_issued() {
        assert_matches!(
            update(&PROJECTS, 1, &Record::new()),
            Err(CoreError::NothingToUpdate)
        );
    }

    #[test]
    fn keys_outside_the_allow_list_never_reach_sql() {
        for key in ["__proto__", "title; DROP TABLE projects", "image", "id"] {
            let mut columns = Record::new();
            columns.insert(key.to_string(), json!("x"));
            assert_matches!(
                update(&PROJECTS, 1, &columns),
                Err(CoreError::UnknownField { .. }),
                "{key}"
            );
            assert_matches!(insert(&PROJECTS, &columns), Err(CoreError::UnknownField { .. }));
        }
    }

    #[test]
    fn explicit_null_binds_typed_null() {
        let stmt = update(&TEAM_MEMBERS, 3, &record(json!({"skills": null}))).unwrap();
        assert_eq!(stmt.params[0], SqlParam::Json(None));

        let stmt = update(&PROJECTS, 3, &record(json!({"second_image": null}))).unwrap();
        assert_eq!(stmt.params[0], SqlParam::Text(None));
    }

    #[test]
    fn invalid_json_text_is_rejected() {
        let columns = record(json!({"features": "[not json"}));
        assert_matches!(update(&PROJECTS, 1, &columns), Err(CoreError::Validation(_)));
    }

    #[test]
    fn json_columns_reject_the_wrong_shape() {
        let columns = to_columns(
            &PROJECTS,
            &record(json!({"technologies": 42})),
        )
        .unwrap();
        assert_matches!(update(&PROJECTS, 1, &columns), Err(CoreError::Validation(msg)) if msg.contains("array"));

        let columns = to_columns(
            &PROJECTS,
            &record(json!({"visualEffects": "[1,2]"})),
        )
        .unwrap();
        assert_matches!(update(&PROJECTS, 1, &columns), Err(CoreError::Validation(msg)) if msg.contains("object"));

        let skills = TEAM_MEMBERS.column("skills").unwrap();
        assert_eq!(
            param_for(skills, &json!(["Rust"])).unwrap(),
            SqlParam::Json(Some("[\"Rust\"]".into()))
        );
        assert!(param_for(skills, &json!("{}")).is_err());
    }

    #[test]
    fn integer_columns_accept_integral_numbers_and_numeric_text() {
        let column = PROJECTS.column("progress").unwrap();
        assert_eq!(param_for(column, &json!(50.0)).unwrap(), SqlParam::Int(Some(50)));
        assert_eq!(param_for(column, &json!("75")).unwrap(), SqlParam::Int(Some(75)));
        assert!(param_for(column, &json!(12.5)).is_err());
        assert!(param_for(column, &json!({"a": 1})).is_err());
    }

    #[test]
    fn select_builds_filters_order_and_limit() {
        let stmt = Select::table(&PROJECTS)
            .eq("category", "Web")
            .eq("featured", true)
            .order_desc("display_priority")
            .order_desc("id")
            .limit(5)
            .build()
            .unwrap();

        assert_eq!(
            stmt.sql,
            "SELECT * FROM projects WHERE category = $1 AND featured = $2 \
             ORDER BY display_priority DESC, id DESC LIMIT $3"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn select_rejects_unknown_columns() {
        let result = Select::table(&PROJECTS)
            .eq("1=1 OR category", "x")
            .order_asc("id")
            .build();
        assert_matches!(result, Err(CoreError::UnknownField { table: "projects", .. }));
    }

    #[test]
    fn starts_with_escapes_wildcards() {
        let stmt = Select::table(&PROJECTS)
            .starts_with("title", "[NEW]_50%")
            .build()
            .unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM projects WHERE title LIKE $1");
        assert_eq!(stmt.params, vec![SqlParam::Text(Some("[NEW]\\_50\\%%".into()))]);
    }

    #[test]
    fn id_statements_bind_the_id() {
        assert_eq!(
            delete_by_id(&PROJECTS, 9),
            Statement {
                sql: "DELETE FROM projects WHERE id = $1".into(),
                params: vec![SqlParam::Int(Some(9))],
            }
        );
        assert_eq!(select_by_id(&TEAM_MEMBERS, 2).params, vec![SqlParam::Int(Some(2))]);
    }
}
