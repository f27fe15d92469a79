mod common;

use chrono::Utc;
use coursetrack::api::services::progress::ProgressService;
use coursetrack::error::ServiceError;
use entities::payments::STATUS_PENDING;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::*;

#[tokio::test]
async fn get_or_create_is_idempotent() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    let first = service.get_or_create(user_id, course_id).await.unwrap();
    let second = service.get_or_create(user_id, course_id).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.completion_percentage, 0.0);
    assert!(!first.is_completed);

    let count = entities::progress::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn get_or_create_enriches_with_course_meta() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;

    let record = ProgressService::new(&db)
        .get_or_create(user_id, course_id)
        .await
        .unwrap();
    let course = record.course.expect("course meta populated");
    assert_eq!(course.title, "Systems Programming");
    assert_eq!(course.duration, 540);
}

#[tokio::test]
async fn get_or_create_forbidden_without_completed_payment() {
    let db = setup_db().await;
    let user_id = seed_user(&db, "Grace Hopper").await;
    let course_id = seed_course(&db, "Compilers", 720).await;
    // A pending payment is not an entitlement.
    seed_payment(&db, user_id, course_id, STATUS_PENDING).await;

    let err = ProgressService::new(&db)
        .get_or_create(user_id, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // No record may be created by a rejected call.
    let count = entities::progress::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_lazily_creates_and_persists() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;

    let record = ProgressService::new(&db)
        .update(user_id, course_id, 120.0, 25.0)
        .await
        .unwrap();
    assert_eq!(record.last_watched_position, 120.0);
    assert_eq!(record.completion_percentage, 25.0);
    assert!(!record.is_completed);
    assert_eq!(record.watch_history.len(), 1);

    let stored = entities::progress::Entity::find()
        .filter(entities::progress::Column::UserId.eq(user_id))
        .one(&db)
        .await
        .unwrap()
        .expect("record persisted");
    assert_eq!(stored.completion_percentage, 25.0);
}

#[tokio::test]
async fn update_clamps_percentage_to_100() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;

    let record = ProgressService::new(&db)
        .update(user_id, course_id, 10.0, 250.0)
        .await
        .unwrap();
    assert_eq!(record.completion_percentage, 100.0);
}

#[tokio::test]
async fn update_rejects_negative_input_before_persisting() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    let err = service.update(user_id, course_id, -1.0, 50.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
    let err = service.update(user_id, course_id, 10.0, -5.0).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));

    let count = entities::progress::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn update_forbidden_without_entitlement() {
    let db = setup_db().await;
    let user_id = seed_user(&db, "Alan Turing").await;
    let course_id = seed_course(&db, "Cryptography", 300).await;

    let err = ProgressService::new(&db)
        .update(user_id, course_id, 10.0, 10.0)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn threshold_latches_completion() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    let before = service.update(user_id, course_id, 120.0, 25.0).await.unwrap();
    assert!(!before.is_completed);
    assert!(before.completed_at.is_none());

    let after = service.update(user_id, course_id, 300.0, 35.0).await.unwrap();
    assert!(after.is_completed);
    let completed_at = after.completed_at.expect("completed_at set");
    assert!((Utc::now() - completed_at).num_seconds().abs() < 5);
}

#[tokio::test]
async fn latch_survives_lower_report() {
    // Overwrite-not-max policy: the stored percentage drops with the report,
    // the completion latch does not.
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    service.update(user_id, course_id, 300.0, 50.0).await.unwrap();
    let record = service.update(user_id, course_id, 60.0, 10.0).await.unwrap();

    assert_eq!(record.completion_percentage, 10.0);
    assert!(record.is_completed);
    assert!(record.completed_at.is_some());
}

#[tokio::test]
async fn watch_history_retains_last_ten_in_order() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    for i in 1..=11 {
        service.update(user_id, course_id, i as f64, 5.0).await.unwrap();
    }

    let record = service.get_or_create(user_id, course_id).await.unwrap();
    let positions: Vec<f64> = record.watch_history.iter().map(|e| e.position).collect();
    assert_eq!(positions, (2..=11).map(|i| i as f64).collect::<Vec<_>>());
}

#[tokio::test]
async fn reset_zeroes_record_and_keeps_it() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;
    let service = ProgressService::new(&db);

    service.update(user_id, course_id, 300.0, 80.0).await.unwrap();
    service.reset(user_id, course_id).await.unwrap();

    let record = service.get_or_create(user_id, course_id).await.unwrap();
    assert_eq!(record.completion_percentage, 0.0);
    assert_eq!(record.last_watched_position, 0.0);
    assert!(!record.is_completed);
    assert!(record.completed_at.is_none());
    assert!(record.watch_history.is_empty());

    let count = entities::progress::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn reset_without_record_is_not_found() {
    let db = setup_db().await;
    let (user_id, course_id) = seed_entitled_pair(&db).await;

    let err = ProgressService::new(&db)
        .reset(user_id, course_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn stats_aggregate_over_users_records() {
    let db = setup_db().await;
    let user_id = seed_user(&db, "Barbara Liskov").await;
    let course_a = seed_course(&db, "Course A", 120).await;
    let course_b = seed_course(&db, "Course B", 240).await;
    seed_payment(&db, user_id, course_a, entities::payments::STATUS_COMPLETED).await;
    seed_payment(&db, user_id, course_b, entities::payments::STATUS_COMPLETED).await;
    let service = ProgressService::new(&db);

    service.update(user_id, course_a, 100.0, 80.0).await.unwrap();
    service.update(user_id, course_b, 50.0, 20.0).await.unwrap();

    let stats = service.stats(user_id).await.unwrap();
    assert_eq!(stats.total_courses, 2);
    assert_eq!(stats.completed_courses, 1);
    assert_eq!(stats.in_progress_courses, 1);
    assert_eq!(stats.average_progress, 50.0);
    assert_eq!(stats.completion_rate, 50.0);
}

#[tokio::test]
async fn stats_are_zero_safe_without_records() {
    let db = setup_db().await;
    let user_id = seed_user(&db, "Nobody Yet").await;

    let stats = ProgressService::new(&db).stats(user_id).await.unwrap();
    assert_eq!(stats.total_courses, 0);
    assert_eq!(stats.average_progress, 0.0);
    assert_eq!(stats.completion_rate, 0.0);
}

#[tokio::test]
async fn list_orders_by_most_recent_update() {
    let db = setup_db().await;
    let user_id = seed_user(&db, "Edsger Dijkstra").await;
    let course_a = seed_course(&db, "Course A", 60).await;
    let course_b = seed_course(&db, "Course B", 60).await;
    seed_payment(&db, user_id, course_a, entities::payments::STATUS_COMPLETED).await;
    seed_payment(&db, user_id, course_b, entities::payments::STATUS_COMPLETED).await;
    let service = ProgressService::new(&db);

    service.update(user_id, course_a, 10.0, 5.0).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    service.update(user_id, course_b, 10.0, 5.0).await.unwrap();

    let list = service.list(user_id).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].course_id, course_b);
    assert_eq!(list[1].course_id, course_a);
}
