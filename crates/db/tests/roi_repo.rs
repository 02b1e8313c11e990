use std::sync::Arc;

use serde_json::{json, Value};
use sqlx::PgPool;

use folio_core::types::Record;
use folio_db::repositories::RoiRepo;
use folio_db::{Database, PerformanceTracker, QueryTimeouts};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn database(pool: PgPool) -> Database {
    Database::new(
        pool,
        Arc::new(PerformanceTracker::default()),
        QueryTimeouts::default(),
    )
}

fn partial(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn id_of(result: folio_db::models::mutation::MutationResult) -> i64 {
    assert!(result.success, "{}", result.message);
    result.id.unwrap()
}

/// One published section with two cards, metrics and two case studies.
async fn seed(db: &Database) -> i64 {
    let section = id_of(
        RoiRepo::create(
            db,
            &partial(json!({"heading": "Returns", "isPublished": true, "displayOrder": 1})),
        )
        .await,
    );
    let revenue = id_of(
        RoiRepo::create_card(db, section, &partial(json!({"title": "Revenue", "displayOrder": 1})))
            .await,
    );
    id_of(
        RoiRepo::create_card(db, section, &partial(json!({"title": "Churn", "displayOrder": 2})))
            .await,
    );
    id_of(
        RoiRepo::create_metric(db, revenue, &partial(json!({"label": "MoM", "value": "12", "unit": "%"})))
            .await,
    );
    id_of(
        RoiRepo::create_case_study(
            db,
            section,
            &partial(json!({"title": "Acme", "isPublished": true})),
        )
        .await,
    );
    id_of(RoiRepo::create_case_study(db, section, &partial(json!({"title": "Draft"}))).await);
    section
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn public_read_hydrates_published_tree(pool: PgPool) {
    let db = database(pool);
    let section_id = seed(&db).await;

    let section = RoiRepo::get_section(&db).await.unwrap();

    assert_eq!(section.id(), Some(section_id));
    assert_eq!(
        section.cards.iter().filter_map(|c| c.title()).collect::<Vec<_>>(),
        vec!["Revenue", "Churn"]
    );
    assert_eq!(section.cards[0].metrics.len(), 1);
    assert_eq!(section.cards[0].metrics[0]["label"], json!("MoM"));
    assert!(section.cards[1].metrics.is_empty());
    assert_eq!(section.case_studies.len(), 1);
    assert_eq!(section.case_studies[0]["title"], json!("Acme"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn public_read_without_published_section_is_none(pool: PgPool) {
    let db = database(pool);
    id_of(RoiRepo::create(&db, &partial(json!({"heading": "Hidden"}))).await);

    assert!(RoiRepo::get_section(&db).await.is_none());
    assert_eq!(RoiRepo::get_all_sections(&db).await.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_read_includes_drafts(pool: PgPool) {
    let db = database(pool);
    let section_id = seed(&db).await;

    let section = RoiRepo::get_section_by_id(&db, section_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(section.case_studies.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deleting_a_section_cascades(pool: PgPool) {
    let db = database(pool.clone());
    let section_id = seed(&db).await;

    assert!(RoiRepo::delete(&db, section_id).await.success);

    let (cards,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roi_cards")
        .fetch_one(&pool)
        .await
        .unwrap();
    let (metrics,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roi_metrics")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(cards, 0);
    assert_eq!(metrics, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn child_of_missing_parent_is_rejected(pool: PgPool) {
    let db = database(pool);

    let result = RoiRepo::create_card(&db, 424_242, &partial(json!({"title": "Orphan"}))).await;

    assert!(!result.success);
    assert!(result.message.contains("not found"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn card_and_case_study_updates(pool: PgPool) {
    let db = database(pool);
    let section_id = seed(&db).await;
    let section = RoiRepo::get_section_by_id(&db, section_id).await.unwrap().unwrap();
    let card_id = section.cards[0].id().unwrap();
    let draft_id = section.case_studies[1]["id"].as_i64().unwrap();

    assert!(RoiRepo::update_card(&db, card_id, &partial(json!({"trend": "up"}))).await.success);
    assert!(
        RoiRepo::update_case_study(&db, draft_id, &partial(json!({"isPublished": true})))
            .await
            .success
    );

    let section = RoiRepo::get_section(&db).await.unwrap();
    assert_eq!(section.cards[0].card["trend"], json!("up"));
    assert_eq!(section.case_studies.len(), 2);

    let metric_id = section.cards[0].metrics[0]["id"].as_i64().unwrap();
    assert!(RoiRepo::delete_metric(&db, metric_id).await.success);
    assert!(RoiRepo::delete_case_study(&db, draft_id).await.success);
    assert!(RoiRepo::delete_card(&db, card_id).await.success);
}
