//! Atomic merge and point reads for the products table.

use chrono::{DateTime, SubsecRound as _, Utc};
use pricetrail_core::{
    MergeAction, MergeOutcome, Observation, ProductRecord, merge_observation, resolve_identity,
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior, named_params};

use super::{PRODUCT_COLUMNS, SqliteStorage, get_conn, row_to_product, ts_to_sql};
use crate::error::StorageError;

const INSERT_SQL: &str = "INSERT INTO products (
        unique_id, platform, product_id, title, category, url, image_url,
        current_price, current_rating, current_reviews, in_stock,
        first_seen, last_seen, created_at, updated_at, times_scraped,
        price_history, rating_history, lowest_price, highest_price, average_price,
        price_trend, price_change_percent
    ) VALUES (
        :unique_id, :platform, :product_id, :title, :category, :url, :image_url,
        :current_price, :current_rating, :current_reviews, :in_stock,
        :first_seen, :last_seen, :created_at, :updated_at, :times_scraped,
        :price_history, :rating_history, :lowest_price, :highest_price, :average_price,
        :price_trend, :price_change_percent
    )";

const UPDATE_SQL: &str = "UPDATE products SET
        platform = :platform, product_id = :product_id, title = :title, category = :category,
        url = :url, image_url = :image_url, current_price = :current_price,
        current_rating = :current_rating, current_reviews = :current_reviews,
        in_stock = :in_stock, first_seen = :first_seen, last_seen = :last_seen,
        created_at = :created_at, updated_at = :updated_at, times_scraped = :times_scraped,
        price_history = :price_history, rating_history = :rating_history,
        lowest_price = :lowest_price, highest_price = :highest_price,
        average_price = :average_price, price_trend = :price_trend,
        price_change_percent = :price_change_percent
    WHERE unique_id = :unique_id";

pub(crate) fn select_by_unique_id(
    conn: &Connection,
    unique_id: &str,
) -> Result<Option<ProductRecord>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE unique_id = ?1");
    Ok(conn.query_row(&sql, [unique_id], row_to_product).optional()?)
}

/// Write every column of `record` with `sql` (either insert or full update).
fn write_record(conn: &Connection, sql: &str, record: &ProductRecord) -> Result<(), StorageError> {
    let price_history = serde_json::to_string(&record.price_history)?;
    let rating_history = serde_json::to_string(&record.rating_history)?;
    let times_scraped = i64::try_from(record.times_scraped).unwrap_or(i64::MAX);

    conn.execute(
        sql,
        named_params! {
            ":unique_id": record.unique_id.as_str(),
            ":platform": record.platform,
            ":product_id": record.product_id,
            ":title": record.title,
            ":category": record.category,
            ":url": record.url,
            ":image_url": record.image_url,
            ":current_price": record.current_price,
            ":current_rating": record.current_rating,
            ":current_reviews": record.current_reviews,
            ":in_stock": record.in_stock,
            ":first_seen": ts_to_sql(&record.first_seen),
            ":last_seen": ts_to_sql(&record.last_seen),
            ":created_at": ts_to_sql(&record.created_at),
            ":updated_at": ts_to_sql(&record.updated_at),
            ":times_scraped": times_scraped,
            ":price_history": price_history,
            ":rating_history": rating_history,
            ":lowest_price": record.lowest_price,
            ":highest_price": record.highest_price,
            ":average_price": record.average_price,
            ":price_trend": record.price_trend.as_str(),
            ":price_change_percent": record.price_change_percent,
        },
    )?;
    Ok(())
}

impl SqliteStorage {
    /// Read, merge and write one observation inside a `BEGIN IMMEDIATE`
    /// transaction. The write lock is taken before the read, so concurrent
    /// merges of the same identity serialize on the database.
    pub fn merge_observation(
        &self,
        obs: &Observation,
        now: DateTime<Utc>,
    ) -> Result<MergeOutcome, StorageError> {
        let unique_id = resolve_identity(obs)?;
        // Stored timestamps carry microseconds; the clock must not be finer.
        let now = now.trunc_subsecs(6);

        let mut conn = get_conn(&self.pool)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = select_by_unique_id(&tx, unique_id.as_str())?;
        if let Some(record) = &existing {
            if !record.is_same_product(obs) {
                return Err(StorageError::Duplicate(format!(
                    "unique id {unique_id} already belongs to {}/{}",
                    record.platform, record.product_id
                )));
            }
        }

        let (record, action, effects) = merge_observation(existing, &unique_id, obs, now);
        match action {
            MergeAction::Inserted => write_record(&tx, INSERT_SQL, &record)?,
            MergeAction::Updated => write_record(&tx, UPDATE_SQL, &record)?,
        }
        tx.commit()?;

        tracing::info!(
            unique_id = %unique_id,
            action = action.as_str(),
            price_changed = effects.price_changed,
            rating_changed = effects.rating_changed,
            times_scraped = record.times_scraped,
            "Merged observation"
        );
        Ok(MergeOutcome::new(action, unique_id))
    }

    pub fn get_by_unique_id(&self, unique_id: &str) -> Result<Option<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        select_by_unique_id(&conn, unique_id)
    }

    pub fn get_product(
        &self,
        platform: &str,
        product_id: &str,
    ) -> Result<Option<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE platform = ?1 AND product_id = ?2"
        );
        Ok(conn.query_row(&sql, [platform, product_id], row_to_product).optional()?)
    }
}
