//! Atomic merge and point reads for the products table.

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound as _, Utc};
use pricetrail_core::{
    MAX_MERGE_ATTEMPTS, MergeAction, MergeOutcome, Observation, ProductRecord, UniqueId,
    UpdateEffects, merge_observation, resolve_identity,
};
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::Query;

use super::{PRODUCT_COLUMNS, PgStorage, row_to_product};
use crate::error::StorageError;
use crate::traits::ProductStore;

const INSERT_SQL: &str = "INSERT INTO products (
        unique_id, platform, product_id, title, category, url, image_url,
        current_price, current_rating, current_reviews, in_stock,
        first_seen, last_seen, created_at, updated_at, times_scraped,
        price_history, rating_history, lowest_price, highest_price, average_price,
        price_trend, price_change_percent
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
              $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
    ON CONFLICT DO NOTHING";

const UPDATE_SQL: &str = "UPDATE products SET
        platform = $2, product_id = $3, title = $4, category = $5, url = $6, image_url = $7,
        current_price = $8, current_rating = $9, current_reviews = $10, in_stock = $11,
        first_seen = $12, last_seen = $13, created_at = $14, updated_at = $15,
        times_scraped = $16, price_history = $17, rating_history = $18,
        lowest_price = $19, highest_price = $20, average_price = $21,
        price_trend = $22, price_change_percent = $23
    WHERE unique_id = $1";

/// Bind every column of `record` in `$1..$23` order.
fn bind_record<'q>(
    query: Query<'q, Postgres, PgArguments>,
    record: &'q ProductRecord,
) -> Result<Query<'q, Postgres, PgArguments>, StorageError> {
    let price_history = serde_json::to_value(&record.price_history)?;
    let rating_history = serde_json::to_value(&record.rating_history)?;
    Ok(query
        .bind(record.unique_id.as_str())
        .bind(record.platform.as_str())
        .bind(record.product_id.as_str())
        .bind(record.title.as_str())
        .bind(record.category.as_str())
        .bind(record.url.as_deref())
        .bind(record.image_url.as_deref())
        .bind(record.current_price)
        .bind(record.current_rating)
        .bind(record.current_reviews.as_deref())
        .bind(record.in_stock)
        .bind(record.first_seen)
        .bind(record.last_seen)
        .bind(record.created_at)
        .bind(record.updated_at)
        .bind(i64::try_from(record.times_scraped).unwrap_or(i64::MAX))
        .bind(price_history)
        .bind(rating_history)
        .bind(record.lowest_price)
        .bind(record.highest_price)
        .bind(record.average_price)
        .bind(record.price_trend.as_str())
        .bind(record.price_change_percent))
}

impl PgStorage {
    /// One locked read-merge-write attempt.
    ///
    /// Returns `None` when a concurrent transaction inserted the identity
    /// between our read and our insert; the caller retries and will then see
    /// (and lock) that row.
    async fn try_merge(
        &self,
        unique_id: &UniqueId,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<Option<(ProductRecord, MergeAction, UpdateEffects)>, StorageError> {
        let mut tx = self.pool.begin().await?;

        let select =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE unique_id = $1 FOR UPDATE");
        let row = sqlx::query(&select).bind(unique_id.as_str()).fetch_optional(&mut *tx).await?;
        let existing = row.as_ref().map(row_to_product).transpose()?;

        if let Some(record) = &existing {
            if !record.is_same_product(obs) {
                return Err(StorageError::Duplicate(format!(
                    "unique id {unique_id} already belongs to {}/{}",
                    record.platform, record.product_id
                )));
            }
        }

        let (record, action, effects) = merge_observation(existing, unique_id, obs, now);
        let sql = match action {
            MergeAction::Inserted => INSERT_SQL,
            MergeAction::Updated => UPDATE_SQL,
        };
        let result = bind_record(sqlx::query(sql), &record)?.execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;
        Ok(Some((record, action, effects)))
    }
}

#[async_trait]
impl ProductStore for PgStorage {
    async fn merge_observation(
        &self,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, StorageError> {
        let unique_id = resolve_identity(obs)?;
        // TIMESTAMPTZ keeps microseconds; the clock must not be finer.
        let now = now.trunc_subsecs(6);

        for attempt in 1..=MAX_MERGE_ATTEMPTS {
            if let Some((record, action, effects)) = self.try_merge(&unique_id, obs, now).await? {
                tracing::info!(
                    unique_id = %unique_id,
                    action = action.as_str(),
                    price_changed = effects.price_changed,
                    rating_changed = effects.rating_changed,
                    times_scraped = record.times_scraped,
                    "Merged observation"
                );
                return Ok(MergeOutcome::new(action, unique_id));
            }
            tracing::debug!(unique_id = %unique_id, attempt, "Lost first-insert race, retrying");
        }

        Err(StorageError::Conflict {
            unique_id: unique_id.into_inner(),
            attempts: MAX_MERGE_ATTEMPTS,
        })
    }

    async fn get_by_unique_id(
        &self,
        unique_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE unique_id = $1");
        let row = sqlx::query(&sql).bind(unique_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE platform = $1 AND product_id = $2"
        );
        let row =
            sqlx::query(&sql).bind(platform).bind(product_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_product).transpose()
    }
}
