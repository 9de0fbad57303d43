//! Integration tests for subject and profile queries.
//!
//! Each test gets its own database on the shared PostgreSQL from
//! `studyplan-test-utils`.

use chrono::NaiveDate;
use uuid::Uuid;

use studyplan_db::models::{Priority, Role};
use studyplan_db::queries::{profiles, subjects};
use studyplan_test_utils::{create_test_db, drop_test_db};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn insert_and_list_orders_by_deadline() {
    let (pool, db_name) = create_test_db().await;

    let user = profiles::insert_profile(&pool, "a@example.com", "Anna", Role::User)
        .await
        .expect("insert_profile should succeed");

    subjects::insert_subject(&pool, user.user_id, "Late", date(2025, 6, 1), Priority::Low)
        .await
        .unwrap();
    let soon = subjects::insert_subject(&pool, user.user_id, "Soon", date(2025, 2, 1), Priority::High)
        .await
        .unwrap();
    assert_eq!(soon.priority, Priority::High);

    let rows = subjects::list_subjects_for_user(&pool, user.user_id)
        .await
        .unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Soon", "Late"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn blank_name_is_rejected_by_schema() {
    let (pool, db_name) = create_test_db().await;

    let user = profiles::insert_profile(&pool, "b@example.com", "", Role::User)
        .await
        .unwrap();
    let result =
        subjects::insert_subject(&pool, user.user_id, "   ", date(2025, 2, 1), Priority::Medium)
            .await;
    assert!(result.is_err(), "blank subject name must be rejected");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn delete_is_scoped_to_owner() {
    let (pool, db_name) = create_test_db().await;

    let owner = profiles::insert_profile(&pool, "o@example.com", "Owner", Role::User)
        .await
        .unwrap();
    let other = profiles::insert_profile(&pool, "x@example.com", "Other", Role::User)
        .await
        .unwrap();
    let row = subjects::insert_subject(&pool, owner.user_id, "Bio", date(2025, 3, 1), Priority::Medium)
        .await
        .unwrap();

    let removed = subjects::delete_subject_for_user(&pool, other.user_id, row.id)
        .await
        .unwrap();
    assert!(!removed, "other users must not delete the subject");

    let removed = subjects::delete_subject_for_user(&pool, owner.user_id, row.id)
        .await
        .unwrap();
    assert!(removed);

    let removed_again = subjects::delete_subject(&pool, row.id).await.unwrap();
    assert!(!removed_again);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn list_all_spans_users() {
    let (pool, db_name) = create_test_db().await;

    for email in ["1@example.com", "2@example.com"] {
        let user = profiles::insert_profile(&pool, email, "", Role::User)
            .await
            .unwrap();
        subjects::insert_subject(&pool, user.user_id, email, date(2025, 4, 1), Priority::Low)
            .await
            .unwrap();
    }

    let all = subjects::list_all_subjects(&pool).await.unwrap();
    assert_eq!(all.len(), 2);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn roles_default_and_toggle() {
    let (pool, db_name) = create_test_db().await;

    let user = profiles::insert_profile(&pool, "r@example.com", "Roma", Role::User)
        .await
        .unwrap();
    assert_eq!(
        profiles::get_role(&pool, user.user_id).await.unwrap(),
        Some(Role::User)
    );

    profiles::set_role(&pool, user.user_id, Role::Admin)
        .await
        .unwrap();
    assert_eq!(
        profiles::get_role(&pool, user.user_id).await.unwrap(),
        Some(Role::Admin)
    );

    let listed = profiles::list_profiles_with_roles(&pool).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].role, Role::Admin);
    assert_eq!(listed[0].email, "r@example.com");

    assert_eq!(profiles::get_role(&pool, Uuid::new_v4()).await.unwrap(), None);
    assert!(profiles::set_role(&pool, Uuid::new_v4(), Role::Admin).await.is_err());

    let by_email = profiles::get_profile_by_email(&pool, "r@example.com")
        .await
        .unwrap()
        .expect("profile should exist");
    assert_eq!(by_email.user_id, user.user_id);

    pool.close().await;
    drop_test_db(&db_name).await;
}
