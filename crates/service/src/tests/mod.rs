//! Service tests: fake stores for failure injection, SQLite for end to end.

use std::time::Duration;

use pricetrail_core::Observation;

use crate::IngestConfig;

#[cfg(feature = "sqlite")]
mod tracker_tests;

pub fn priced(platform: &str, product_id: &str, price: f64) -> Observation {
    Observation::builder(platform, product_id, format!("Listing {product_id}")).price(price).build()
}

pub fn fast_timeout_config() -> IngestConfig {
    IngestConfig::default().with_workers(4).with_storage_timeout(Duration::from_millis(50))
}
