//! MaintenanceStore implementation for PgStorage.

use async_trait::async_trait;

use super::PgStorage;
use crate::error::StorageError;
use crate::traits::MaintenanceStore;
use crate::types::count_to_u64;

#[async_trait]
impl MaintenanceStore for PgStorage {
    async fn count_products(&self) -> Result<u64, StorageError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products").fetch_one(&self.pool).await?;
        Ok(count_to_u64(count))
    }

    async fn purge_unpriced(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM products WHERE current_price IS NULL")
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected();
        if deleted > 0 {
            tracing::info!(deleted, "Purged products without a current price");
        }
        Ok(deleted)
    }

    async fn purge_all(&self) -> Result<u64, StorageError> {
        let deleted =
            sqlx::query("DELETE FROM products").execute(&self.pool).await?.rows_affected();
        tracing::warn!(deleted, "Deleted all product records");
        Ok(deleted)
    }
}
