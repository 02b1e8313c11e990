//! Project entity: a portfolio entry.

use serde::Serialize;

use folio_core::normalize;
use folio_core::schema::PROJECTS;
use folio_core::types::{DbId, Record};

use super::{flag, id, int, string_list, text};

/// Projects with at least this many `updated_days` become eligible for
/// featuring.
pub const AUTO_FEATURE_AFTER_DAYS: i64 = 3;

/// The three status values the site gives special treatment to. Anything
/// else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectStatus {
    InDevelopment,
    BetaTesting,
    RecentlyLaunched,
    Other(String),
}

impl ProjectStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "In Development" => ProjectStatus::InDevelopment,
            "Beta Testing" => ProjectStatus::BetaTesting,
            "Recently Launched" => ProjectStatus::RecentlyLaunched,
            other => ProjectStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::InDevelopment => "In Development",
            ProjectStatus::BetaTesting => "Beta Testing",
            ProjectStatus::RecentlyLaunched => "Recently Launched",
            ProjectStatus::Other(s) => s,
        }
    }
}

/// A normalized `projects` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Project(Record);

impl Project {
    pub(crate) fn new(normalized: Record) -> Self {
        Self(normalized)
    }

    /// Normalize a raw row.
    pub fn from_row(row: Record) -> Self {
        Self(normalize::from_row(&PROJECTS, row))
    }

    pub fn id(&self) -> Option<DbId> {
        id(&self.0)
    }

    pub fn title(&self) -> Option<&str> {
        text(&self.0, "title")
    }

    pub fn category(&self) -> Option<&str> {
        text(&self.0, "category")
    }

    /// Primary image; the placeholder when none was stored.
    pub fn image(&self) -> Option<&str> {
        text(&self.0, "image_url")
    }

    pub fn link(&self) -> Option<&str> {
        text(&self.0, "link_url")
    }

    pub fn status(&self) -> Option<ProjectStatus> {
        text(&self.0, "status").map(ProjectStatus::parse)
    }

    pub fn technologies(&self) -> Vec<String> {
        string_list(&self.0, "technologies")
    }

    pub fn features(&self) -> Vec<String> {
        string_list(&self.0, "features")
    }

    pub fn exclusive_features(&self) -> Vec<String> {
        string_list(&self.0, "exclusive_features")
    }

    pub fn featured(&self) -> bool {
        flag(&self.0, "featured")
    }

    pub fn showcase_location(&self) -> Option<&str> {
        text(&self.0, "showcase_location")
    }

    pub fn display_priority(&self) -> i64 {
        int(&self.0, "display_priority").unwrap_or(0)
    }

    pub fn updated_days(&self) -> i64 {
        int(&self.0, "updated_days").unwrap_or(0)
    }

    /// Whether the caller-driven promotion rule would feature this project.
    ///
    /// The promotion itself is an ordinary partial update; see
    /// [`ProjectRepo::promote_to_featured`](crate::repositories::ProjectRepo::promote_to_featured).
    pub fn should_auto_feature(&self) -> bool {
        self.updated_days() >= AUTO_FEATURE_AFTER_DAYS && !self.featured()
    }

    pub fn as_record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }
}
