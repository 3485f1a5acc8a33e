//! Async storage traits for backend-agnostic product access.
//!
//! Split by concern so that consumers can depend on only the capability they
//! need. `ProductStore` is the only write path for product records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricetrail_core::{MergeOutcome, Observation, ProductRecord};

use crate::error::StorageError;
use crate::types::ProductStats;

/// Atomic per-identity merge plus point reads.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Merge `obs` into the record for its identity, inserting when absent.
    ///
    /// The read, the merge computation and the write run atomically with
    /// respect to concurrent merges of the same identity. `now` is the clock
    /// value stamped on bookkeeping fields and appended history points.
    async fn merge_observation(
        &self,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, StorageError>;

    async fn get_by_unique_id(&self, unique_id: &str)
    -> Result<Option<ProductRecord>, StorageError>;

    async fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError>;
}

/// Read-only retrieval backing the query layer.
#[async_trait]
pub trait ProductQueryStore: Send + Sync {
    /// Exact platform match, most recently updated first. `None` returns
    /// every match.
    async fn products_by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// Exact category match, most recently updated first.
    async fn products_by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// All products sorted by `updated_at` descending.
    async fn recent_products(&self, limit: usize) -> Result<Vec<ProductRecord>, StorageError>;

    /// `current_rating >= min_rating`, by rating then `last_seen`, both descending.
    async fn trending_products(
        &self,
        min_rating: f64,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    /// Downward-trending records whose change is below `-threshold_percent`,
    /// largest drop first. `None` returns every match.
    async fn price_drops(
        &self,
        threshold_percent: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError>;

    async fn product_stats(&self) -> Result<ProductStats, StorageError>;
}

/// Out-of-band maintenance. Never invoked by the merge path.
#[async_trait]
pub trait MaintenanceStore: Send + Sync {
    async fn count_products(&self) -> Result<u64, StorageError>;

    /// Delete records that have never carried a price. Returns rows removed.
    async fn purge_unpriced(&self) -> Result<u64, StorageError>;

    /// Delete every record. Returns rows removed.
    async fn purge_all(&self) -> Result<u64, StorageError>;
}
