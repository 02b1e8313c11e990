//! Compile-time description of every persisted table.
//!
//! This is the allow-list the statement builder checks every key against.
//! A column name that does not appear here can never reach SQL text.

use serde_json::Value;

/// Storage type of a column, used to coerce and bind values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Boolean,
    /// Stored as `jsonb`; written as JSON text with an explicit cast.
    Json,
    Timestamp,
}

/// Value a normalized record carries when neither name is present on the row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Null,
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
    EmptyArray,
    EmptyObject,
}

impl Fallback {
    pub fn value(&self) -> Value {
        match self {
            Fallback::Null => Value::Null,
            Fallback::Text(s) => Value::String((*s).to_string()),
            Fallback::Integer(n) => Value::from(*n),
            Fallback::Boolean(b) => Value::Bool(*b),
            Fallback::EmptyArray => Value::Array(Vec::new()),
            Fallback::EmptyObject => Value::Object(serde_json::Map::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Persisted snake_case name.
    pub name: &'static str,
    /// In-memory camelCase name, when the two differ.
    pub alias: Option<&'static str>,
    pub kind: ColumnKind,
    pub fallback: Fallback,
    pub writable: bool,
}

impl Column {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            alias: None,
            kind,
            fallback: Fallback::Null,
            writable: true,
        }
    }

    const fn alias(self, alias: &'static str) -> Self {
        Self {
            alias: Some(alias),
            ..self
        }
    }

    const fn or(self, fallback: Fallback) -> Self {
        Self { fallback, ..self }
    }

    const fn read_only(self) -> Self {
        Self {
            writable: false,
            ..self
        }
    }

    /// Whether `value` has the JSON shape this column stores.
    ///
    /// Structured columns take their shape from their fallback: an
    /// empty-array fallback means the column only ever holds arrays, an
    /// empty-object fallback means objects. Any other column accepts
    /// every shape.
    pub fn accepts_json(&self, value: &Value) -> bool {
        match self.fallback {
            Fallback::EmptyArray => value.is_array(),
            Fallback::EmptyObject => value.is_object(),
            _ => true,
        }
    }

    /// Whether `key` names this column under either convention.
    pub fn answers_to(&self, key: &str) -> bool {
        self.name == key || self.alias == Some(key)
    }
}

#[derive(Debug)]
pub struct TableSchema {
    pub table: &'static str,
    /// Human-facing entity name used in log lines and messages.
    pub entity: &'static str,
    /// Column echoed back alongside `id` when a row is deleted.
    pub label_column: &'static str,
    pub columns: &'static [Column],
}

impl TableSchema {
    /// Look up a column by its snake_case or camelCase name.
    pub fn resolve(&self, key: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.answers_to(key))
    }

    /// Look up a column by its persisted name only.
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &'static Column> {
        self.columns.iter().filter(|c| c.writable)
    }
}

use ColumnKind::{Boolean, Integer, Json, Text, Timestamp};

const ID: Column = Column::new("id", Integer).read_only();
const CREATED_AT: Column = Column::new("created_at", Timestamp)
    .alias("createdAt")
    .read_only();
const LAST_UPDATED: Column = Column::new("last_updated", Timestamp)
    .alias("lastUpdated")
    .read_only();

pub const PROJECT_PLACEHOLDER_IMAGE: &str = "/projects/placeholder.jpg";
pub const TEAM_PLACEHOLDER_IMAGE: &str = "/team/placeholder.jpg";

pub static PROJECTS: TableSchema = TableSchema {
    table: "projects",
    entity: "Project",
    label_column: "title",
    columns: &[
        ID,
        Column::new("title", Text),
        Column::new("description", Text),
        Column::new("image_url", Text)
            .alias("image")
            .or(Fallback::Text(PROJECT_PLACEHOLDER_IMAGE)),
        Column::new("second_image", Text).alias("secondImage"),
        Column::new("category", Text),
        Column::new("technologies", Json).or(Fallback::EmptyArray),
        Column::new("link_url", Text).alias("link"),
        Column::new("status", Text),
        Column::new("progress", Integer),
        Column::new("features", Json).or(Fallback::EmptyArray),
        Column::new("exclusive_features", Json)
            .alias("exclusiveFeatures")
            .or(Fallback::EmptyArray),
        Column::new("tech_details", Json)
            .alias("techDetails")
            .or(Fallback::EmptyObject),
        Column::new("visual_effects", Json)
            .alias("visualEffects")
            .or(Fallback::EmptyObject),
        Column::new("code_language", Text).alias("codeLanguage"),
        Column::new("code_title", Text).alias("codeTitle"),
        Column::new("code_content", Text).alias("codeContent"),
        Column::new("display_priority", Integer)
            .alias("displayPriority")
            .or(Fallback::Integer(0)),
        Column::new("featured", Boolean).or(Fallback::Boolean(false)),
        Column::new("showcase_location", Text).alias("showcaseLocation"),
        Column::new("github_url", Text).alias("githubUrl"),
        Column::new("github_frontend_url", Text).alias("githubFrontendUrl"),
        Column::new("github_backend_url", Text).alias("githubBackendUrl"),
        Column::new("updated_days", Integer)
            .alias("updatedDays")
            .or(Fallback::Integer(0)),
        CREATED_AT,
        LAST_UPDATED,
    ],
};

pub static TEAM_MEMBERS: TableSchema = TableSchema {
    table: "team_members",
    entity: "TeamMember",
    label_column: "name",
    columns: &[
        ID,
        Column::new("name", Text),
        Column::new("title", Text),
        Column::new("bio", Text),
        Column::new("image_url", Text)
            .alias("image")
            .or(Fallback::Text(TEAM_PLACEHOLDER_IMAGE)),
        Column::new("linkedin_url", Text).alias("linkedinUrl"),
        Column::new("github_url", Text).alias("githubUrl"),
        Column::new("twitter_url", Text).alias("twitterUrl"),
        Column::new("dribbble_url", Text).alias("dribbbleUrl"),
        Column::new("website_url", Text).alias("websiteUrl"),
        Column::new("skills", Json).or(Fallback::EmptyArray),
        Column::new("display_order", Integer)
            .alias("displayOrder")
            .or(Fallback::Integer(0)),
        Column::new("is_leader", Boolean)
            .alias("isLeader")
            .or(Fallback::Boolean(false)),
        Column::new("is_active", Boolean)
            .alias("isActive")
            .or(Fallback::Boolean(true)),
        CREATED_AT,
        LAST_UPDATED,
    ],
};

pub static ROI_SECTIONS: TableSchema = TableSchema {
    table: "roi_sections",
    entity: "RoiSection",
    label_column: "heading",
    columns: &[
        ID,
        Column::new("heading", Text),
        Column::new("subheading", Text),
        Column::new("background_image", Text).alias("backgroundImage"),
        Column::new("video_url", Text).alias("videoUrl"),
        Column::new("theme", Text),
        Column::new("is_published", Boolean)
            .alias("isPublished")
            .or(Fallback::Boolean(false)),
        Column::new("display_order", Integer)
            .alias("displayOrder")
            .or(Fallback::Integer(0)),
        CREATED_AT,
        LAST_UPDATED,
    ],
};

pub static ROI_CARDS: TableSchema = TableSchema {
    table: "roi_cards",
    entity: "RoiCard",
    label_column: "title",
    columns: &[
        ID,
        Column::new("section_id", Integer).alias("sectionId"),
        Column::new("title", Text),
        Column::new("value", Text),
        Column::new("trend", Text),
        Column::new("category", Text),
        Column::new("display_order", Integer)
            .alias("displayOrder")
            .or(Fallback::Integer(0)),
        Column::new("is_featured", Boolean)
            .alias("isFeatured")
            .or(Fallback::Boolean(false)),
        CREATED_AT,
        LAST_UPDATED,
    ],
};

/// Metrics are handed back as raw rows, so no column carries an alias.
pub static ROI_METRICS: TableSchema = TableSchema {
    table: "roi_metrics",
    entity: "RoiMetric",
    label_column: "label",
    columns: &[
        ID,
        Column::new("card_id", Integer),
        Column::new("label", Text),
        Column::new("value", Text),
        Column::new("unit", Text),
        Column::new("display_order", Integer),
        Column::new("created_at", Timestamp).read_only(),
        Column::new("last_updated", Timestamp).read_only(),
    ],
};

pub static ROI_CASE_STUDIES: TableSchema = TableSchema {
    table: "roi_case_studies",
    entity: "RoiCaseStudy",
    label_column: "title",
    columns: &[
        ID,
        Column::new("section_id", Integer).alias("sectionId"),
        Column::new("title", Text),
        Column::new("body", Text),
        Column::new("is_published", Boolean)
            .alias("isPublished")
            .or(Fallback::Boolean(false)),
        Column::new("display_order", Integer)
            .alias("displayOrder")
            .or(Fallback::Integer(0)),
        CREATED_AT,
        LAST_UPDATED,
    ],
};

/// Every table the persistence layer knows about.
pub static ALL_TABLES: [&TableSchema; 6] = [
    &PROJECTS,
    &TEAM_MEMBERS,
    &ROI_SECTIONS,
    &ROI_CARDS,
    &ROI_METRICS,
    &ROI_CASE_STUDIES,
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn structured_columns_accept_only_their_shape() {
        let technologies = PROJECTS.column("technologies").unwrap();
        assert!(technologies.accepts_json(&serde_json::json!(["Rust"])));
        assert!(!technologies.accepts_json(&serde_json::json!(42)));
        assert!(!technologies.accepts_json(&serde_json::json!({"a": 1})));

        let visual_effects = PROJECTS.column("visual_effects").unwrap();
        assert!(visual_effects.accepts_json(&serde_json::json!({})));
        assert!(!visual_effects.accepts_json(&serde_json::json!([1, 2])));
    }

    #[test]
    fn names_and_aliases_are_unique_per_table() {
        for schema in ALL_TABLES {
            let mut seen = HashSet::new();
            for column in schema.columns {
                assert!(seen.insert(column.name), "{}.{}", schema.table, column.name);
                if let Some(alias) = column.alias {
                    assert!(seen.insert(alias), "{}.{alias}", schema.table);
                }
            }
        }
    }

    #[test]
    fn label_column_exists() {
        for schema in ALL_TABLES {
            assert!(schema.column(schema.label_column).is_some(), "{}", schema.table);
        }
    }

    #[test]
    fn every_table_has_read_only_bookkeeping_columns() {
        for schema in ALL_TABLES {
            for name in ["id", "created_at", "last_updated"] {
                let column = schema.column(name).unwrap();
                assert!(!column.writable, "{}.{name}", schema.table);
            }
        }
    }

    #[test]
    fn resolve_accepts_either_convention() {
        assert_eq!(PROJECTS.resolve("image").unwrap().name, "image_url");
        assert_eq!(PROJECTS.resolve("image_url").unwrap().name, "image_url");
        assert!(PROJECTS.resolve("__proto__").is_none());
    }

    #[test]
    fn structured_project_columns_never_default_to_null() {
        for name in [
            "technologies",
            "features",
            "exclusive_features",
            "tech_details",
            "visual_effects",
        ] {
            let column = PROJECTS.column(name).unwrap();
            assert_eq!(column.kind, ColumnKind::Json);
            assert_ne!(column.fallback, Fallback::Null, "{name}");
        }
    }
}
