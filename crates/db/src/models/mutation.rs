use serde::Serialize;

use folio_core::types::{DbId, Record};

/// Outcome of a create, update, or delete.
///
/// Mutations never return `Err` to their caller; every failure is folded
/// into `success: false` with a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DbId>,
    pub message: String,
    /// Identifying fields of a deleted row, echoed back for confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<Record>,
}

impl MutationResult {
    pub fn succeeded(id: Option<DbId>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            id,
            message: message.into(),
            deleted: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            message: message.into(),
            deleted: None,
        }
    }

    pub fn with_deleted(mut self, deleted: Record) -> Self {
        self.deleted = Some(deleted);
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn failure_serializes_without_optional_fields() {
        let value = serde_json::to_value(MutationResult::failed("Project 4 not found")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "Project 4 not found"}));
    }

    #[test]
    fn success_carries_id() {
        let value = serde_json::to_value(MutationResult::succeeded(Some(12), "Project created"))
            .unwrap();
        assert_eq!(
            value,
            json!({"success": true, "id": 12, "message": "Project created"})
        );
    }
}
