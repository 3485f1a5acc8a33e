//! Test utilities and module declarations for storage tests.

use chrono::{DateTime, Duration, TimeZone as _, Utc};
use pricetrail_core::Observation;
use tempfile::TempDir;

use crate::SqliteStorage;

#[allow(clippy::unwrap_used, reason = "test code")]
pub fn create_test_storage() -> (SqliteStorage, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let storage = SqliteStorage::new(&db_path, 4).unwrap();
    (storage, temp_dir)
}

/// Fixed clock origin; `at(n)` is `n` minutes later.
#[allow(clippy::unwrap_used, reason = "test code")]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub fn priced(platform: &str, product_id: &str, price: f64) -> Observation {
    Observation::builder(platform, product_id, format!("Listing {product_id}"))
        .price(price)
        .category("electronics")
        .build()
}
