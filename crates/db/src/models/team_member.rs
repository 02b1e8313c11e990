//! TeamMember entity.

use serde::Serialize;

use folio_core::normalize;
use folio_core::schema::TEAM_MEMBERS;
use folio_core::types::{DbId, Record};

use super::{flag, id, int, string_list, text};

/// A normalized `team_members` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TeamMember(Record);

impl TeamMember {
    pub(crate) fn new(normalized: Record) -> Self {
        Self(normalized)
    }

    pub fn from_row(row: Record) -> Self {
        Self(normalize::from_row(&TEAM_MEMBERS, row))
    }

    pub fn id(&self) -> Option<DbId> {
        id(&self.0)
    }

    pub fn name(&self) -> Option<&str> {
        text(&self.0, "name")
    }

    pub fn title(&self) -> Option<&str> {
        text(&self.0, "title")
    }

    pub fn image(&self) -> Option<&str> {
        text(&self.0, "image_url")
    }

    pub fn skills(&self) -> Vec<String> {
        string_list(&self.0, "skills")
    }

    pub fn display_order(&self) -> i64 {
        int(&self.0, "display_order").unwrap_or(0)
    }

    pub fn is_leader(&self) -> bool {
        flag(&self.0, "is_leader")
    }

    /// Inactive members are hidden from default listings but kept.
    pub fn is_active(&self) -> bool {
        flag(&self.0, "is_active")
    }

    pub fn as_record(&self) -> &Record {
        &self.0
    }

    pub fn into_record(self) -> Record {
        self.0
    }
}
