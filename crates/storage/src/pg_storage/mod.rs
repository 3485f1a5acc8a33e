//! PostgreSQL storage backend using sqlx.
//!
//! Split into modular files by concern.

mod maintenance;
mod products;
mod queries;

use chrono::{DateTime, Utc};
use pricetrail_core::{
    PG_POOL_ACQUIRE_TIMEOUT_SECS, PG_POOL_IDLE_TIMEOUT_SECS, PG_POOL_MAX_CONNECTIONS, PriceTrend,
    ProductRecord, UniqueId,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::error::StorageError;

use super::pg_migrations::run_pg_migrations;

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = "unique_id, platform, product_id, title, category, \
     url, image_url, current_price, current_rating, current_reviews, in_stock, first_seen, \
     last_seen, created_at, updated_at, times_scraped, price_history, rating_history, \
     lowest_price, highest_price, average_price, price_trend, price_change_percent";

#[derive(Clone, Debug)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(PG_POOL_MAX_CONNECTIONS)
            .acquire_timeout(std::time::Duration::from_secs(PG_POOL_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(std::time::Duration::from_secs(PG_POOL_IDLE_TIMEOUT_SECS))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;
        run_pg_migrations(&pool).await.map_err(|e| StorageError::Migration(e.to_string()))?;
        tracing::info!("PgStorage initialized");
        Ok(Self { pool })
    }
}

fn parse_json_column<T: serde::de::DeserializeOwned>(
    row: &sqlx::postgres::PgRow,
    column: &str,
) -> Result<T, StorageError> {
    let val: serde_json::Value = row.try_get(column)?;
    serde_json::from_value(val).map_err(|e| StorageError::DataCorruption {
        context: format!("products.{column}"),
        source: Box::new(e),
    })
}

pub(crate) fn row_to_product(row: &sqlx::postgres::PgRow) -> Result<ProductRecord, StorageError> {
    let platform: String = row.try_get("platform")?;
    let product_id: String = row.try_get("product_id")?;
    let unique_id =
        UniqueId::new(&platform, &product_id).map_err(|e| StorageError::DataCorruption {
            context: "products identity".to_owned(),
            source: Box::new(e),
        })?;
    let trend_raw: String = row.try_get("price_trend")?;
    let price_trend = trend_raw.parse::<PriceTrend>().unwrap_or_else(|_| {
        tracing::warn!(
            invalid_trend = %trend_raw,
            "corrupt price_trend in DB, defaulting to stable"
        );
        PriceTrend::Stable
    });
    let times_scraped: i64 = row.try_get("times_scraped")?;
    let first_seen: DateTime<Utc> = row.try_get("first_seen")?;
    let last_seen: DateTime<Utc> = row.try_get("last_seen")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(ProductRecord {
        unique_id,
        platform,
        product_id,
        title: row.try_get("title")?,
        category: row.try_get("category")?,
        url: row.try_get("url")?,
        image_url: row.try_get("image_url")?,
        current_price: row.try_get("current_price")?,
        current_rating: row.try_get("current_rating")?,
        current_reviews: row.try_get("current_reviews")?,
        in_stock: row.try_get("in_stock")?,
        first_seen,
        last_seen,
        created_at,
        updated_at,
        times_scraped: u64::try_from(times_scraped).unwrap_or(0),
        price_history: parse_json_column(row, "price_history")?,
        rating_history: parse_json_column(row, "rating_history")?,
        lowest_price: row.try_get("lowest_price")?,
        highest_price: row.try_get("highest_price")?,
        average_price: row.try_get("average_price")?,
        price_trend,
        price_change_percent: row.try_get("price_change_percent")?,
    })
}

/// Map rows, logging and skipping the ones that fail to decode.
pub(crate) fn rows_to_products(rows: &[sqlx::postgres::PgRow]) -> Vec<ProductRecord> {
    rows.iter()
        .filter_map(|row| match row_to_product(row) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("Row read error: {}", e);
                None
            },
        })
        .collect()
}
