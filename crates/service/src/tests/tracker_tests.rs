//! End to end through the facade on a temporary SQLite database.

#![allow(clippy::unwrap_used)]

use pricetrail_core::{MergeAction, Observation, PriceTrend};
use pricetrail_storage::{StorageError, StorageSettings};
use tempfile::TempDir;

use super::priced;
use crate::{IngestConfig, PriceTracker, ServiceError};

async fn create_tracker(workers: usize) -> (PriceTracker, TempDir) {
    let dir = TempDir::new().unwrap();
    let settings = StorageSettings::sqlite(dir.path().join("products.db"));
    let tracker =
        PriceTracker::connect(&settings, IngestConfig::default().with_workers(workers))
            .await
            .unwrap();
    (tracker, dir)
}

#[tokio::test]
async fn scenario_and_price_drop_query() {
    let (tracker, _dir) = create_tracker(2).await;
    let queries = tracker.queries();

    let a = tracker.ingest(&priced("amazon", "X1", 1000.0)).await.unwrap();
    assert_eq!(a.action, MergeAction::Inserted);
    assert!(queries.price_drops(None, None).await.unwrap().is_empty());

    let b = tracker.ingest(&priced("amazon", "X1", 800.0)).await.unwrap();
    assert_eq!(b.action, MergeAction::Updated);
    let drops = queries.price_drops(None, None).await.unwrap();
    assert_eq!(drops.len(), 1);
    assert_eq!(drops[0].unique_id.as_str(), "amazon_X1");

    tracker.ingest(&priced("amazon", "X1", 800.0)).await.unwrap();
    let record = queries.get_product("amazon", "X1").await.unwrap().unwrap();
    assert_eq!(record.times_scraped, 3);
    assert_eq!(record.price_history.len(), 2);
    assert_eq!(record.lowest_price, Some(800.0));
    assert_eq!(record.highest_price, Some(1000.0));
    assert_eq!(record.average_price, Some(900.0));
    assert_eq!(record.price_trend, PriceTrend::Down);
    assert!((record.price_change_percent - -20.0).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn bulk_uniqueness_and_per_identity_order() {
    let (tracker, _dir) = create_tracker(4).await;

    let mut batch = Vec::new();
    for step in 0..20 {
        batch.push(priced("amazon", "SAME", 500.0 - f64::from(step) * 10.0));
        batch.push(priced("flipkart", &format!("F{}", step % 5), 100.0));
    }
    let summary = tracker.ingest_batch(batch).await;

    assert_eq!(summary.total(), 40);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.inserted, 6);
    assert_eq!(summary.updated, 34);

    let record = tracker.queries().get_by_unique_id("amazon_SAME").await.unwrap().unwrap();
    assert_eq!(record.times_scraped, 20);
    let prices: Vec<f64> = record.price_history.iter().map(|p| p.value).collect();
    let expected: Vec<f64> = (0..20).map(|step| 500.0 - f64::from(step) * 10.0).collect();
    assert_eq!(prices, expected);
    assert!(record.price_history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(record.lowest_price, Some(310.0));
    assert_eq!(record.highest_price, Some(500.0));
    assert_eq!(tracker.count_products().await.unwrap(), 6);
}

#[tokio::test]
async fn trending_stats_and_maintenance() {
    let (tracker, _dir) = create_tracker(2).await;
    let rated = |id: &str, rating: f64| {
        Observation::builder("flipkart", id, "Item").rating(rating).category("audio").build()
    };
    tracker.ingest(&rated("R1", 4.6)).await.unwrap();
    tracker.ingest(&rated("R2", 3.1)).await.unwrap();
    tracker.ingest(&priced("amazon", "P1", 99.0)).await.unwrap();

    let trending = tracker.queries().trending(None).await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].product_id, "R1");

    let stats = tracker.queries().stats().await.unwrap();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.platforms, vec!["amazon", "flipkart"]);
    assert_eq!(stats.categories, vec!["audio", "uncategorized"]);

    assert_eq!(tracker.queries().by_category("audio", None).await.unwrap().len(), 2);
    assert_eq!(tracker.queries().by_platform("amazon", None).await.unwrap().len(), 1);
    assert_eq!(tracker.queries().all_products(Some(2)).await.unwrap().len(), 2);

    assert_eq!(tracker.queries().all_products(None).await.unwrap().len(), 3);

    assert_eq!(tracker.purge_unpriced().await.unwrap(), 2);
    assert_eq!(tracker.count_products().await.unwrap(), 1);
    assert_eq!(tracker.purge_all().await.unwrap(), 1);
    assert_eq!(tracker.count_products().await.unwrap(), 0);
}

#[tokio::test]
async fn invalid_threshold_is_rejected() {
    let (tracker, _dir) = create_tracker(1).await;
    for threshold in [-1.0, f64::NAN, f64::INFINITY] {
        let err = tracker.queries().price_drops(Some(threshold), Some(10)).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}

#[cfg(not(feature = "postgres"))]
#[tokio::test]
async fn unreachable_backend_fails_at_connect() {
    let settings = StorageSettings::Postgres { database_url: "postgres://nowhere/db".to_owned() };
    let err = PriceTracker::connect(&settings, IngestConfig::default()).await.err().unwrap();
    assert!(matches!(err, ServiceError::Storage(StorageError::Config(_))));
}
