//! Integration tests for PgStorage.
//! Run with: DATABASE_URL=... cargo test -p pricetrail-storage --features postgres -- --ignored pg_

#![cfg(feature = "postgres")]
#![allow(clippy::unwrap_used, reason = "integration test code")]

use std::sync::Arc;

use chrono::{Duration, Utc};
use pricetrail_core::{MergeAction, Observation, PriceTrend};
use pricetrail_storage::PgStorage;
use pricetrail_storage::traits::{MaintenanceStore, ProductQueryStore, ProductStore};
use uuid::Uuid;

async fn create_pg_storage() -> PgStorage {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for PgStorage integration tests");
    PgStorage::new(&url).await.expect("Failed to connect to PostgreSQL")
}

/// Platform name unique to one test run so tests never see each other's rows.
fn test_platform() -> String {
    format!("test-{}", Uuid::new_v4().simple())
}

fn priced(platform: &str, product_id: &str, price: f64) -> Observation {
    Observation::builder(platform, product_id, "Integration listing").price(price).build()
}

#[tokio::test]
#[ignore]
async fn pg_scenario_insert_drop_repeat() {
    let storage = create_pg_storage().await;
    let platform = test_platform();
    let t0 = Utc::now();

    let a = storage.merge_observation(&priced(&platform, "X1", 1000.0), t0).await.unwrap();
    assert_eq!(a.action, MergeAction::Inserted);
    storage
        .merge_observation(&priced(&platform, "X1", 800.0), t0 + Duration::seconds(1))
        .await
        .unwrap();
    storage
        .merge_observation(&priced(&platform, "X1", 800.0), t0 + Duration::seconds(2))
        .await
        .unwrap();

    let record = storage.get_product(&platform, "X1").await.unwrap().unwrap();
    assert_eq!(record.times_scraped, 3);
    assert_eq!(record.price_history.len(), 2);
    assert_eq!(record.lowest_price, Some(800.0));
    assert_eq!(record.highest_price, Some(1000.0));
    assert_eq!(record.average_price, Some(900.0));
    assert_eq!(record.price_trend, PriceTrend::Down);

    let drops = storage.price_drops(10.0, None).await.unwrap();
    assert!(drops.iter().any(|r| r.unique_id == record.unique_id));
}

#[tokio::test]
#[ignore]
async fn pg_concurrent_first_inserts_converge_on_one_record() {
    let storage = Arc::new(create_pg_storage().await);
    let platform = test_platform();
    let now = Utc::now();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let storage = Arc::clone(&storage);
            let obs = priced(&platform, "RACE", 10.0);
            tokio::spawn(async move { storage.merge_observation(&obs, now).await })
        })
        .collect();

    let mut inserted = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().action == MergeAction::Inserted {
            inserted += 1;
        }
    }
    assert_eq!(inserted, 1);

    let record = storage.get_product(&platform, "RACE").await.unwrap().unwrap();
    assert_eq!(record.times_scraped, 16);
    assert_eq!(record.price_history.len(), 1);
}

#[tokio::test]
#[ignore]
async fn pg_stats_and_maintenance() {
    let storage = create_pg_storage().await;
    let platform = test_platform();
    let now = Utc::now();

    storage.merge_observation(&priced(&platform, "P", 5.0), now).await.unwrap();
    storage
        .merge_observation(&Observation::builder(platform.as_str(), "Q", "No price").build(), now)
        .await
        .unwrap();

    let stats = storage.product_stats().await.unwrap();
    assert!(stats.platforms.contains(&platform));
    assert!(storage.count_products().await.unwrap() >= 2);

    assert!(storage.purge_unpriced().await.unwrap() >= 1);
    assert!(storage.get_product(&platform, "Q").await.unwrap().is_none());
    assert!(storage.get_product(&platform, "P").await.unwrap().is_some());
}
