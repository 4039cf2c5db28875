//! DATABASE_URL 이 필요한 테스트: `cargo test -- --ignored`

use chrono::{Duration, DurationRound, Utc};
use marketplace_service::database::DatabaseManager;
use marketplace_service::error::MarketError;
use marketplace_service::lifecycle::{BumpPolicy, BumpRequest, ExpirySweeper};
use marketplace_service::listing::{Category, ListingStatus, ValidListing};
use marketplace_service::query::{ListingFilters, SortField, SortOrder, Viewer};
use marketplace_service::store::{ListingStore, PostgresListingStore};
use std::sync::Arc;

/// 데이터베이스 매니저 설정
async fn setup() -> (Arc<DatabaseManager>, PostgresListingStore) {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL environment variable must be set to run postgres tests");
    let db_manager = Arc::new(DatabaseManager::connect(&database_url).await.unwrap());
    db_manager.initialize_database().await.unwrap();
    let store = PostgresListingStore::new(Arc::clone(&db_manager));
    (db_manager, store)
}

/// 테스트마다 겹치지 않는 사용자 id
fn unique_user() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap() % 1_000_000_000_000
}

fn valid(title: &str, price: i64, category: Category) -> ValidListing {
    ValidListing {
        title: title.to_string(),
        description: "테스트 매물".to_string(),
        price,
        category,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_sweep_and_bump_roundtrip() {
    let (db, store) = setup().await;
    let user = unique_user();
    // Postgres 는 마이크로초 정밀도
    let now = Utc::now().duration_trunc(Duration::microseconds(1)).unwrap();

    let listing = store
        .insert(
            user,
            &valid("Postgres 책상", 10_000, Category::Home),
            now - Duration::seconds(1),
            now - Duration::days(3),
        )
        .await
        .unwrap();
    assert_eq!(listing.status, ListingStatus::Active);

    let sweeper = ExpirySweeper::new(Arc::new(PostgresListingStore::new(Arc::clone(&db))));
    assert!(sweeper.sweep_expired(now).await.unwrap() >= 1);
    let expired = store.find(listing.id).await.unwrap().unwrap();
    assert_eq!(expired.status, ListingStatus::Expired);

    let policy = BumpPolicy::default();
    let bumped = store
        .bump(&BumpRequest::free(listing.id, user), &policy, now)
        .await
        .unwrap();
    assert_eq!(bumped.status, ListingStatus::Active);
    assert_eq!(bumped.expires_at, now + Duration::days(3));
    assert_eq!(bumped.bump_count, 1);

    let err = store
        .bump(&BumpRequest::free(listing.id, user), &policy, now + Duration::hours(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MarketError::Cooldown {
            hours_until_eligible: 23
        }
    ));

    let archived = store.archive(listing.id, now).await.unwrap();
    assert_eq!(archived.status, ListingStatus::Archived);
    let err = store
        .bump(&BumpRequest::free(listing.id, user), &policy, now + Duration::days(2))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Archived(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_composed_list_query_runs() {
    let (_db, store) = setup().await;
    let user = unique_user();
    let now = Utc::now();
    for (title, price) in [("a_100%", 600), ("b", 1_200), ("c", 3_000)] {
        store
            .insert(user, &valid(title, price, Category::Books), now + Duration::days(3), now)
            .await
            .unwrap();
    }

    let query = ListingFilters {
        category: Some("books".to_string()),
        price_min: Some(500),
        price_max: Some(2_000),
        user_id: Some(user),
        sort_by: Some(SortField::Price),
        sort_order: Some(SortOrder::Asc),
        ..Default::default()
    }
    .compose(Viewer::Public)
    .unwrap();
    let listings = store.list(&query).await.unwrap();
    let prices: Vec<i64> = listings.iter().map(|l| l.price).collect();
    assert_eq!(prices, vec![600, 1_200]);

    let query = ListingFilters {
        search: Some("100%".to_string()),
        user_id: Some(user),
        ..Default::default()
    }
    .compose(Viewer::Admin)
    .unwrap();
    let listings = store.list(&query).await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].title, "a_100%");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_bumps_single_winner() {
    let (db, _store) = setup().await;
    let user = unique_user();
    let now = Utc::now();
    let store = Arc::new(PostgresListingStore::new(Arc::clone(&db)));
    let listing = store
        .insert(user, &valid("동시성", 1_000, Category::Other), now + Duration::days(3), now)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .bump(&BumpRequest::free(listing.id, user), &BumpPolicy::default(), now)
                .await
        }));
    }
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 1);
    assert_eq!(store.find(listing.id).await.unwrap().unwrap().bump_count, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_sweeps_expire_each_listing_once() {
    let (db, _store) = setup().await;
    let user = unique_user();
    let now = Utc::now();
    let store = Arc::new(PostgresListingStore::new(Arc::clone(&db)));
    let mut ids = Vec::new();
    for i in 0..8 {
        let listing = store
            .insert(
                user,
                &valid(&format!("정리 {i}"), 1_000, Category::Other),
                now - Duration::seconds(1),
                now - Duration::days(3),
            )
            .await
            .unwrap();
        ids.push(listing.id);
    }

    let mut handles = Vec::new();
    for _ in 0..6 {
        let sweeper = ExpirySweeper::new(Arc::clone(&store) as Arc<dyn ListingStore>);
        handles.push(tokio::spawn(async move { sweeper.sweep_expired(now).await }));
    }
    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap().unwrap();
    }
    // 다른 테스트가 남긴 만료 대상도 함께 정리될 수 있다
    assert!(total >= 8);

    for id in ids {
        let stored = store.find(id).await.unwrap().unwrap();
        assert_eq!(stored.status, ListingStatus::Expired);
    }
}
