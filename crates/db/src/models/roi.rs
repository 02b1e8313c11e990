//! ROI reporting aggregate: section → cards → metrics, plus case studies.

use serde::Serialize;

use folio_core::types::{DbId, Record};

use super::{flag, id, text};

/// A section hydrated with its children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiAggregate {
    #[serde(flatten)]
    pub section: Record,
    pub cards: Vec<RoiCard>,
    pub case_studies: Vec<Record>,
}

impl RoiAggregate {
    pub fn id(&self) -> Option<DbId> {
        id(&self.section)
    }

    pub fn heading(&self) -> Option<&str> {
        text(&self.section, "heading")
    }

    pub fn is_published(&self) -> bool {
        flag(&self.section, "is_published")
    }
}

/// A card with its metric rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiCard {
    #[serde(flatten)]
    pub card: Record,
    /// Raw `roi_metrics` rows; empty when the metrics read failed.
    pub metrics: Vec<Record>,
}

impl RoiCard {
    pub fn id(&self) -> Option<DbId> {
        id(&self.card)
    }

    pub fn title(&self) -> Option<&str> {
        text(&self.card, "title")
    }
}
