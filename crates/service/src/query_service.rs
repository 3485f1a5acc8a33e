use std::sync::Arc;

use pricetrail_core::{
    DEFAULT_LIST_LIMIT, DEFAULT_PRICE_DROP_THRESHOLD, DEFAULT_TRENDING_LIMIT, MAX_QUERY_LIMIT,
    ProductRecord, TRENDING_MIN_RATING,
};
use pricetrail_storage::traits::{ProductQueryStore, ProductStore};
use pricetrail_storage::{ProductStats, StorageBackend};

use crate::ServiceError;

/// Read-only access to product records. Never mutates.
pub struct QueryService<S = StorageBackend> {
    storage: Arc<S>,
}

impl<S> Clone for QueryService<S> {
    fn clone(&self) -> Self {
        Self { storage: Arc::clone(&self.storage) }
    }
}

/// Resolve a listing limit: the default when absent, never above the global ceiling.
fn bounded_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).min(MAX_QUERY_LIMIT)
}

impl<S> QueryService<S>
where
    S: ProductStore + ProductQueryStore,
{
    #[must_use]
    pub const fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub async fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, ServiceError> {
        Ok(self.storage.get_product(platform, product_id).await?)
    }

    pub async fn get_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<ProductRecord>, ServiceError> {
        Ok(self.storage.get_by_unique_id(unique_id).await?)
    }

    /// Every record on `platform` unless the caller passes a limit.
    pub async fn by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, ServiceError> {
        Ok(self.storage.products_by_platform(platform, limit).await?)
    }

    /// Every record in `category` unless the caller passes a limit.
    pub async fn by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, ServiceError> {
        Ok(self.storage.products_by_category(category, limit).await?)
    }

    /// All products, most recently updated first. Defaults to 100 rows.
    pub async fn all_products(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, ServiceError> {
        let limit = bounded_limit(limit, DEFAULT_LIST_LIMIT);
        Ok(self.storage.recent_products(limit).await?)
    }

    /// Products rated at least 4.0, best rated then most recently seen first.
    /// Defaults to 10 rows.
    pub async fn trending(&self, limit: Option<usize>) -> Result<Vec<ProductRecord>, ServiceError> {
        let limit = bounded_limit(limit, DEFAULT_TRENDING_LIMIT);
        Ok(self.storage.trending_products(TRENDING_MIN_RATING, limit).await?)
    }

    /// Records whose last change was a drop of more than `threshold_percent`
    /// (10% when absent). Every match unless the caller passes a limit.
    pub async fn price_drops(
        &self,
        threshold_percent: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, ServiceError> {
        let threshold_percent = threshold_percent.unwrap_or(DEFAULT_PRICE_DROP_THRESHOLD);
        if !threshold_percent.is_finite() || threshold_percent < 0.0 {
            return Err(ServiceError::InvalidInput(format!(
                "price drop threshold must be a non-negative percentage, got {threshold_percent}"
            )));
        }
        Ok(self.storage.price_drops(threshold_percent, limit).await?)
    }

    pub async fn stats(&self) -> Result<ProductStats, ServiceError> {
        Ok(self.storage.product_stats().await?)
    }
}
