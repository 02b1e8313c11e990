//! Repository for the `team_members` table.

use serde_json::Value;

use folio_core::schema::TEAM_MEMBERS;
use folio_core::types::{DbId, Record};

use super::crud;
use crate::error::DbResult;
use crate::executor::{Database, QueryKind};
use crate::models::mutation::MutationResult;
use crate::models::team_member::TeamMember;
use crate::statement::Select;

/// Provides CRUD operations for team members.
///
/// The public roster only includes active members; deactivated members
/// stay in the table and are reachable through the admin listing.
pub struct TeamMemberRepo;

impl TeamMemberRepo {
    /// Active members ordered by `display_order`, then id.
    pub async fn get_all(db: &Database) -> DbResult<Vec<TeamMember>> {
        let select = Select::table(&TEAM_MEMBERS).eq("is_active", true);
        Self::list(db, "team_members.get_all", select).await
    }

    pub async fn get_all_including_inactive(db: &Database) -> DbResult<Vec<TeamMember>> {
        let select = Select::table(&TEAM_MEMBERS);
        Self::list(db, "team_members.get_all_including_inactive", select).await
    }

    /// Active members flagged as leadership.
    pub async fn get_leaders(db: &Database) -> DbResult<Vec<TeamMember>> {
        let select = Select::table(&TEAM_MEMBERS)
            .eq("is_active", true)
            .eq("is_leader", true);
        Self::list(db, "team_members.get_leaders", select).await
    }

    pub async fn get_by_id(db: &Database, id: DbId) -> DbResult<Option<TeamMember>> {
        let row = crud::find_by_id(db, &TEAM_MEMBERS, id, QueryKind::Primary).await?;
        Ok(row.map(TeamMember::new))
    }

    pub async fn create(db: &Database, partial: &Record) -> MutationResult {
        crud::create(db, &TEAM_MEMBERS, partial).await
    }

    pub async fn update(db: &Database, id: DbId, partial: &Record) -> MutationResult {
        crud::update(db, &TEAM_MEMBERS, id, partial).await
    }

    pub async fn delete(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &TEAM_MEMBERS, id).await
    }

    /// Show or hide a member on the public roster without deleting them.
    pub async fn set_active(db: &Database, id: DbId, active: bool) -> MutationResult {
        let mut partial = Record::new();
        partial.insert("is_active".into(), Value::Bool(active));
        crud::update(db, &TEAM_MEMBERS, id, &partial).await
    }

    async fn list(
        db: &Database,
        operation: &str,
        select: Select<'_>,
    ) -> DbResult<Vec<TeamMember>> {
        let select = select.order_asc("display_order").order_asc("id");
        let rows = crud::list(db, &TEAM_MEMBERS, operation, QueryKind::Primary, select).await?;
        Ok(rows.into_iter().map(TeamMember::new).collect())
    }
}
