//! Repository for the `projects` table.

use serde_json::Value;

use folio_core::schema::PROJECTS;
use folio_core::types::{DbId, Record};

use super::crud;
use crate::error::DbResult;
use crate::executor::{Database, QueryKind};
use crate::models::mutation::MutationResult;
use crate::models::project::Project;
use crate::statement::Select;

/// Title prefix the legacy admin used to mark freshly added projects.
pub const NEWLY_ADDED_PREFIX: &str = "[NEW]";

/// Provides CRUD operations and filtered listings for projects.
///
/// Listings are ordered by `display_priority` (highest first), then newest.
pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn get_all(db: &Database) -> DbResult<Vec<Project>> {
        Self::list(db, "projects.get_all", Select::table(&PROJECTS)).await
    }

    /// Returns `None` when no project has this id.
    pub async fn get_by_id(db: &Database, id: DbId) -> DbResult<Option<Project>> {
        let row = crud::find_by_id(db, &PROJECTS, id, QueryKind::Primary).await?;
        Ok(row.map(Project::new))
    }

    pub async fn get_by_category(db: &Database, category: &str) -> DbResult<Vec<Project>> {
        let select = Select::table(&PROJECTS).eq("category", category);
        Self::list(db, "projects.get_by_category", select).await
    }

    pub async fn get_featured(db: &Database) -> DbResult<Vec<Project>> {
        let select = Select::table(&PROJECTS).eq("featured", true);
        Self::list(db, "projects.get_featured", select).await
    }

    /// Projects routed into a dedicated page section.
    pub async fn get_by_showcase_location(
        db: &Database,
        location: &str,
    ) -> DbResult<Vec<Project>> {
        let select = Select::table(&PROJECTS).eq("showcase_location", location);
        Self::list(db, "projects.get_by_showcase_location", select).await
    }

    /// Projects whose title carries [`NEWLY_ADDED_PREFIX`].
    pub async fn get_newly_added(db: &Database) -> DbResult<Vec<Project>> {
        let select = Select::table(&PROJECTS).starts_with("title", NEWLY_ADDED_PREFIX);
        Self::list(db, "projects.get_newly_added", select).await
    }

    /// Insert a project from a partial object in either naming convention.
    pub async fn create(db: &Database, partial: &Record) -> MutationResult {
        crud::create(db, &PROJECTS, partial).await
    }

    /// Apply any subset of fields. Fails if the project does not exist.
    ///
    /// Concurrent updates to the same project are last-write-wins.
    pub async fn update(db: &Database, id: DbId, partial: &Record) -> MutationResult {
        crud::update(db, &PROJECTS, id, partial).await
    }

    pub async fn delete(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &PROJECTS, id).await
    }

    /// Set `featured = true`. Callers decide when, typically via
    /// [`Project::should_auto_feature`].
    pub async fn promote_to_featured(db: &Database, id: DbId) -> MutationResult {
        let mut partial = Record::new();
        partial.insert("featured".into(), Value::Bool(true));
        crud::update(db, &PROJECTS, id, &partial).await
    }

    async fn list(db: &Database, operation: &str, select: Select<'_>) -> DbResult<Vec<Project>> {
        let select = select.order_desc("display_priority").order_desc("id");
        let rows = crud::list(db, &PROJECTS, operation, QueryKind::Primary, select).await?;
        Ok(rows.into_iter().map(Project::new).collect())
    }
}
