//! Async trait implementations for `SqliteStorage` via `spawn_blocking`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pricetrail_core::{MergeOutcome, Observation, ProductRecord};

use crate::error::StorageError;
use crate::sqlite::SqliteStorage;
use crate::traits::{MaintenanceStore, ProductQueryStore, ProductStore};
use crate::types::ProductStats;

/// Helper: run a blocking closure on the tokio blocking pool.
async fn blocking<F, T>(f: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Body-generating macro for async-to-blocking delegation.
///
/// Arguments carry a capture marker. `@ref` clones a borrowed value into the
/// closure, `@str` takes an owned `String`, and `@val` moves the argument as is.
macro_rules! delegate {
    ($self:ident, $method:ident $(, @$kind:ident $arg:ident)*) => {{
        let s = $self.clone();
        $(delegate!(@capture $kind $arg);)*
        blocking(move || s.$method($(delegate!(@pass $kind $arg)),*)).await
    }};
    (@capture ref $arg:ident) => { let $arg = $arg.clone(); };
    (@capture str $arg:ident) => { let $arg = $arg.to_owned(); };
    (@capture val $arg:ident) => { };
    (@pass ref $arg:ident) => { &$arg };
    (@pass str $arg:ident) => { &$arg };
    (@pass val $arg:ident) => { $arg };
}

// ── ProductStore ─────────────────────────────────────────────────

#[async_trait]
impl ProductStore for SqliteStorage {
    async fn merge_observation(
        &self,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, StorageError> {
        delegate!(self, merge_observation, @ref obs, @val now)
    }
    async fn get_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        delegate!(self, get_by_unique_id, @str unique_id)
    }
    async fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        delegate!(self, get_product, @str platform, @str product_id)
    }
}

// ── ProductQueryStore ────────────────────────────────────────────

#[async_trait]
impl ProductQueryStore for SqliteStorage {
    async fn products_by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        delegate!(self, products_by_platform, @str platform, @val limit)
    }
    async fn products_by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        delegate!(self, products_by_category, @str category, @val limit)
    }
    async fn recent_products(&self, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        delegate!(self, recent_products, @val limit)
    }
    async fn trending_products(
        &self,
        min_rating: f64,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        delegate!(self, trending_products, @val min_rating, @val limit)
    }
    async fn price_drops(
        &self,
        threshold_percent: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        delegate!(self, price_drops, @val threshold_percent, @val limit)
    }
    async fn product_stats(&self) -> Result<ProductStats, StorageError> {
        delegate!(self, product_stats)
    }
}

// ── MaintenanceStore ─────────────────────────────────────────────

#[async_trait]
impl MaintenanceStore for SqliteStorage {
    async fn count_products(&self) -> Result<u64, StorageError> {
        delegate!(self, count_products)
    }
    async fn purge_unpriced(&self) -> Result<u64, StorageError> {
        delegate!(self, purge_unpriced)
    }
    async fn purge_all(&self) -> Result<u64, StorageError> {
        delegate!(self, purge_all)
    }
}
