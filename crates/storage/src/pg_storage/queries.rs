//! ProductQueryStore implementation for PgStorage.

use async_trait::async_trait;
use pricetrail_core::ProductRecord;

use super::{PRODUCT_COLUMNS, PgStorage, rows_to_products};
use crate::error::StorageError;
use crate::traits::ProductQueryStore;
use crate::types::{ProductStats, count_to_u64, usize_to_i64};

// A NULL bound on LIMIT is treated by PostgreSQL as LIMIT ALL.
#[async_trait]
impl ProductQueryStore for PgStorage {
    async fn products_by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE platform = $1
             ORDER BY updated_at DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(platform)
            .bind(limit.map(usize_to_i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_products(&rows))
    }

    async fn products_by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = $1
             ORDER BY updated_at DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(category)
            .bind(limit.map(usize_to_i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_products(&rows))
    }

    async fn recent_products(&self, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY updated_at DESC LIMIT $1");
        let rows = sqlx::query(&sql).bind(usize_to_i64(limit)).fetch_all(&self.pool).await?;
        Ok(rows_to_products(&rows))
    }

    async fn trending_products(
        &self,
        min_rating: f64,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE current_rating >= $1
             ORDER BY current_rating DESC, last_seen DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(min_rating)
            .bind(usize_to_i64(limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_products(&rows))
    }

    async fn price_drops(
        &self,
        threshold_percent: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE price_trend = 'down' AND price_change_percent < $1
             ORDER BY price_change_percent ASC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(-threshold_percent)
            .bind(limit.map(usize_to_i64))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows_to_products(&rows))
    }

    async fn product_stats(&self) -> Result<ProductStats, StorageError> {
        let (total, drops, increases): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*),
                    COUNT(*) FILTER (WHERE price_trend = 'down'),
                    COUNT(*) FILTER (WHERE price_trend = 'up')
             FROM products",
        )
        .fetch_one(&self.pool)
        .await?;
        let platforms: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT platform FROM products ORDER BY platform")
                .fetch_all(&self.pool)
                .await?;
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM products ORDER BY category")
                .fetch_all(&self.pool)
                .await?;

        Ok(ProductStats::new(
            count_to_u64(total),
            platforms,
            categories,
            count_to_u64(drops),
            count_to_u64(increases),
        ))
    }
}
