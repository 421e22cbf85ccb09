//! User lifecycle through the repository façade against the embedded store.

mod common;

use bookgraph_core::error::BookgraphError;
use bookgraph_core::id::UserId;
use bookgraph_core::types::UserProfile;
use common::*;

// ============================================================================
// Create / lookup
// ============================================================================

#[tokio::test]
async fn test_created_user_reads_back_equal() {
    let repo = memory_repository().await;
    let profile = UserProfile::new("Ann", "ann@example.com")
        .with_location("Lisbon")
        .with_external_id("fb-100");

    let created = repo.create_user(profile.clone()).await.unwrap();
    let fetched = repo.get_user_by_id(created.id()).await.unwrap();

    assert_eq!(fetched.id(), created.id());
    assert_eq!(fetched.profile(), &profile);
}

#[tokio::test]
async fn test_created_users_get_distinct_ids() {
    let repo = memory_repository().await;
    let a = create_user(&repo, "Ann").await;
    let b = create_user(&repo, "Ann").await;
    assert_ne!(a.id(), b.id());
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let repo = memory_repository().await;
    let err = repo
        .get_user_by_id(&UserId::from("no-such-user"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(matches!(err, BookgraphError::NotFound { ref resource, .. } if resource == "user"));
}

#[tokio::test]
async fn test_lookup_by_external_id() {
    let repo = memory_repository().await;
    let created = repo
        .create_user(UserProfile::new("Bo", "bo@example.com").with_external_id("fb-7"))
        .await
        .unwrap();

    let found = repo.get_user_by_external_id("fb-7").await.unwrap();
    assert_eq!(found.id(), created.id());
    assert!(repo
        .get_user_by_external_id("fb-8")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_shared_external_id_is_integrity_violation() {
    let repo = memory_repository().await;
    for name in ["Cy", "Di"] {
        repo.create_user(UserProfile::new(name, "x@example.com").with_external_id("fb-dup"))
            .await
            .unwrap();
    }

    let err = repo.get_user_by_external_id("fb-dup").await.unwrap_err();
    assert!(err.is_integrity_violation());
}

// ============================================================================
// Cache behaviour
// ============================================================================

#[tokio::test]
async fn test_second_lookup_does_not_reach_store() {
    let (repo, store) = counting_repository().await;
    let user = create_user(&repo, "Ann").await;

    let first = repo.get_user_by_id(user.id()).await.unwrap();
    let reads_after_first = store.reads();
    let second = repo.get_user_by_id(user.id()).await.unwrap();

    assert_eq!(first.profile(), second.profile());
    assert_eq!(store.reads(), reads_after_first);
    assert_eq!(repo.cache_stats().hits, 1);
}

#[tokio::test]
async fn test_update_is_visible_to_next_lookup() {
    let repo = memory_repository().await;
    let user = create_user(&repo, "Ann").await;
    repo.get_user_by_id(user.id()).await.unwrap();

    let updated = UserProfile::new("Annie", "annie@example.com").with_location("Porto");
    repo.update_user(user.id(), updated.clone()).await.unwrap();

    let fetched = repo.get_user_by_id(user.id()).await.unwrap();
    assert_eq!(fetched.profile(), &updated);
    assert_eq!(repo.cache_stats().invalidations, 1);
}

#[tokio::test]
async fn test_update_overwrites_every_attribute() {
    let repo = memory_repository().await;
    let user = repo
        .create_user(
            UserProfile::new("Ann", "ann@example.com")
                .with_location("Lisbon")
                .with_external_id("fb-1"),
        )
        .await
        .unwrap();

    let returned = repo
        .update_user(user.id(), UserProfile::new("Ann", "ann@example.com"))
        .await
        .unwrap();

    assert_eq!(returned.id(), user.id());
    assert_eq!(returned.profile().location, None);
    assert_eq!(returned.external_id(), None);
}

#[tokio::test]
async fn test_update_of_missing_user_is_not_found() {
    let (repo, store) = counting_repository().await;
    let err = repo
        .update_user(
            &UserId::from("ghost"),
            UserProfile::new("Nobody", "nobody@example.com"),
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(store.writes(), 1);
    assert_eq!(repo.cache_stats().invalidations, 0);
}

#[tokio::test]
async fn test_blank_name_is_rejected() {
    let (repo, store) = counting_repository().await;
    let err = repo
        .create_user(UserProfile::new("", "ann@example.com"))
        .await
        .unwrap_err();

    assert!(matches!(err, BookgraphError::InvalidInput(_)));
    assert_eq!(store.writes(), 0);
}
