//! Repository for the ROI reporting aggregate.
//!
//! A section owns cards (each owning metric rows) and case studies. Reads
//! hydrate the whole tree and every child fetch runs under the shorter child
//! deadline. A failed metrics fetch always degrades to an empty collection.
//! A failed card or case-study fetch does the same on admin reads, but fails
//! the attempt on the public read so the retry loop can recover it.

use std::time::Instant;

use futures::future::join_all;
use serde_json::Value;

use folio_core::error::CoreError;
use folio_core::normalize;
use folio_core::schema::{TableSchema, ROI_CARDS, ROI_CASE_STUDIES, ROI_METRICS, ROI_SECTIONS};
use folio_core::types::{DbId, Record};

use super::crud;
use crate::error::DbResult;
use crate::executor::{Database, QueryKind};
use crate::models::mutation::MutationResult;
use crate::models::roi::{RoiAggregate, RoiCard};
use crate::retry::{with_retry, RetryPolicy};
use crate::statement::Select;

/// Which children a hydrated section exposes, and how strictly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Audience {
    /// Published case studies only. Card and case-study failures propagate.
    Public,
    /// Everything, published or not. Every child failure is tolerated.
    Admin,
}

pub struct RoiRepo;

impl RoiRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The highest-priority published section, fully hydrated.
    ///
    /// Retried under the default [`RetryPolicy`]. Returns `None` both when no
    /// section is published and when every attempt failed.
    pub async fn get_section(db: &Database) -> Option<RoiAggregate> {
        Self::get_section_with(db, &RetryPolicy::default()).await
    }

    pub async fn get_section_with(db: &Database, policy: &RetryPolicy) -> Option<RoiAggregate> {
        with_retry(db.tracker(), "roi_sections.get_section", policy, |_| async move {
            let select = Select::table(&ROI_SECTIONS)
                .eq("is_published", true)
                .order_asc("display_order")
                .order_asc("id")
                .limit(1);
            let section = crud::list(
                db,
                &ROI_SECTIONS,
                "roi_sections.get_section",
                QueryKind::Primary,
                select,
            )
            .await?
            .into_iter()
            .next();

            match section {
                Some(section) => Self::hydrate(db, section, Audience::Public).await.map(Some),
                None => Ok(None),
            }
        })
        .await
    }

    /// Every section, published or not, each fully hydrated.
    ///
    /// Not retried. A failure to list the sections themselves yields an
    /// empty list; child failures only empty the affected collection.
    pub async fn get_all_sections(db: &Database) -> Vec<RoiAggregate> {
        let select = Select::table(&ROI_SECTIONS)
            .order_asc("display_order")
            .order_asc("id");
        let sections = match crud::list(
            db,
            &ROI_SECTIONS,
            "roi_sections.get_all",
            QueryKind::Primary,
            select,
        )
        .await
        {
            Ok(sections) => sections,
            Err(err) => {
                tracing::error!(error = %err, "Failed to list ROI sections");
                return Vec::new();
            }
        };

        let hydrated = join_all(
            sections
                .into_iter()
                .map(|section| Self::hydrate(db, section, Audience::Admin)),
        )
        .await;

        // Admin hydration tolerates child failures, so this only fails on a
        // broken invariant.
        match hydrated.into_iter().collect::<DbResult<Vec<_>>>() {
            Ok(sections) => sections,
            Err(err) => {
                tracing::error!(error = %err, "Failed to hydrate ROI sections");
                Vec::new()
            }
        }
    }

    /// A single section regardless of publish state, fully hydrated.
    pub async fn get_section_by_id(db: &Database, id: DbId) -> DbResult<Option<RoiAggregate>> {
        match crud::find_by_id(db, &ROI_SECTIONS, id, QueryKind::Primary).await? {
            Some(section) => Self::hydrate(db, section, Audience::Admin).await.map(Some),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Sections
    // -----------------------------------------------------------------------

    pub async fn create(db: &Database, partial: &Record) -> MutationResult {
        crud::create(db, &ROI_SECTIONS, partial).await
    }

    pub async fn update(db: &Database, id: DbId, partial: &Record) -> MutationResult {
        crud::update(db, &ROI_SECTIONS, id, partial).await
    }

    /// Removes the section together with its cards, metrics and case
    /// studies (the foreign keys cascade).
    pub async fn delete(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &ROI_SECTIONS, id).await
    }

    // -----------------------------------------------------------------------
    // Cards
    // -----------------------------------------------------------------------

    pub async fn create_card(db: &Database, section_id: DbId, partial: &Record) -> MutationResult {
        create_child(db, &ROI_SECTIONS, section_id, &ROI_CARDS, "section_id", partial).await
    }

    pub async fn update_card(db: &Database, id: DbId, partial: &Record) -> MutationResult {
        crud::update(db, &ROI_CARDS, id, partial).await
    }

    pub async fn delete_card(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &ROI_CARDS, id).await
    }

    // -----------------------------------------------------------------------
    // Metrics
    // -----------------------------------------------------------------------

    pub async fn create_metric(db: &Database, card_id: DbId, partial: &Record) -> MutationResult {
        create_child(db, &ROI_CARDS, card_id, &ROI_METRICS, "card_id", partial).await
    }

    pub async fn delete_metric(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &ROI_METRICS, id).await
    }

    // -----------------------------------------------------------------------
    // Case studies
    // -----------------------------------------------------------------------

    pub async fn create_case_study(
        db: &Database,
        section_id: DbId,
        partial: &Record,
    ) -> MutationResult {
        create_child(
            db,
            &ROI_SECTIONS,
            section_id,
            &ROI_CASE_STUDIES,
            "section_id",
            partial,
        )
        .await
    }

    pub async fn update_case_study(db: &Database, id: DbId, partial: &Record) -> MutationResult {
        crud::update(db, &ROI_CASE_STUDIES, id, partial).await
    }

    pub async fn delete_case_study(db: &Database, id: DbId) -> MutationResult {
        crud::delete(db, &ROI_CASE_STUDIES, id).await
    }

    // -----------------------------------------------------------------------
    // Hydration
    // -----------------------------------------------------------------------

    async fn hydrate(
        db: &Database,
        section: Record,
        audience: Audience,
    ) -> DbResult<RoiAggregate> {
        let Some(section_id) = row_id(&section) else {
            return Ok(RoiAggregate {
                section,
                cards: Vec::new(),
                case_studies: Vec::new(),
            });
        };

        let (cards, case_studies) = tokio::join!(
            Self::cards_for(db, section_id, audience),
            Self::case_studies_for(db, section_id, audience),
        );

        Ok(RoiAggregate {
            section,
            cards: cards?,
            case_studies: case_studies?,
        })
    }

    async fn cards_for(
        db: &Database,
        section_id: DbId,
        audience: Audience,
    ) -> DbResult<Vec<RoiCard>> {
        let select = Select::table(&ROI_CARDS)
            .eq("section_id", section_id)
            .order_asc("display_order")
            .order_asc("id");
        let cards = children(
            db,
            &ROI_CARDS,
            "roi_cards.get_by_section",
            select,
            audience,
        )
        .await?;

        Ok(join_all(cards.into_iter().map(|card| Self::with_metrics(db, card))).await)
    }

    async fn with_metrics(db: &Database, card: Record) -> RoiCard {
        let metrics = match row_id(&card) {
            Some(card_id) => {
                let select = Select::table(&ROI_METRICS)
                    .eq("card_id", card_id)
                    .order_asc("display_order")
                    .order_asc("id");
                let operation = "roi_metrics.get_by_card";
                let result =
                    crud::list(db, &ROI_METRICS, operation, QueryKind::Child, select).await;
                best_effort(operation, result)
            }
            None => Vec::new(),
        };
        RoiCard { card, metrics }
    }

    async fn case_studies_for(
        db: &Database,
        section_id: DbId,
        audience: Audience,
    ) -> DbResult<Vec<Record>> {
        let mut select = Select::table(&ROI_CASE_STUDIES).eq("section_id", section_id);
        if audience == Audience::Public {
            select = select.eq("is_published", true);
        }
        let select = select.order_asc("display_order").order_asc("id");
        children(
            db,
            &ROI_CASE_STUDIES,
            "roi_case_studies.get_by_section",
            select,
            audience,
        )
        .await
    }
}

/// Section-level child read.
async fn children(
    db: &Database,
    schema: &TableSchema,
    operation: &str,
    select: Select<'_>,
    audience: Audience,
) -> DbResult<Vec<Record>> {
    let result = crud::list(db, schema, operation, QueryKind::Child, select).await;
    match audience {
        Audience::Public => result,
        Audience::Admin => Ok(best_effort(operation, result)),
    }
}

/// Failures are logged and yield no rows.
fn best_effort(operation: &str, result: DbResult<Vec<Record>>) -> Vec<Record> {
    match result {
        Ok(rows) => rows,
        Err(err) => {
            tracing::warn!(operation, error = %err, "Child fetch failed, continuing without it");
            Vec::new()
        }
    }
}

/// Insert a child row under an existing parent.
///
/// The parent id comes from the argument. A conflicting parent id in the
/// payload is rejected rather than silently overridden.
async fn create_child(
    db: &Database,
    parent: &TableSchema,
    parent_id: DbId,
    child: &TableSchema,
    foreign_key: &'static str,
    partial: &Record,
) -> MutationResult {
    let operation = format!("{}.create", child.table);
    let started = Instant::now();

    let mut columns = match crud::validate_id(parent, parent_id)
        .and_then(|()| normalize::to_columns(child, partial))
    {
        Ok(columns) => columns,
        Err(err) => return crud::rejected(db, &operation, started, err),
    };

    match columns.get(foreign_key).and_then(Value::as_i64) {
        Some(supplied) if supplied != parent_id => {
            let err = CoreError::Validation(format!(
                "{foreign_key} {supplied} does not match {} {parent_id}",
                parent.entity
            ));
            return crud::rejected(db, &operation, started, err);
        }
        _ => {}
    }

    match crud::find_by_id(db, parent, parent_id, QueryKind::Primary).await {
        Ok(Some(_)) => {}
        Ok(None) => return crud::not_found(parent, parent_id),
        Err(err) => {
            tracing::error!(entity = child.entity, error = %err, "Parent lookup failed");
            return MutationResult::failed(format!("Failed to create {}: {err}", child.entity));
        }
    }

    columns.insert(foreign_key.into(), Value::from(parent_id));
    crud::create(db, child, &columns).await
}

fn row_id(row: &Record) -> Option<DbId> {
    row.get("id").and_then(Value::as_i64)
}
