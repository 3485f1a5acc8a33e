//! `SQLite` storage implementation.
//!
//! All methods are synchronous; `sqlite_async` lifts them onto the blocking
//! pool for the async traits.

// SQLite stores times_scraped as i64, the domain type is u64
#![allow(
    clippy::as_conversions,
    clippy::cast_sign_loss,
    reason = "negative values are clamped to zero before the cast"
)]

mod maintenance;
mod products;
mod queries;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use pricetrail_core::{PriceTrend, ProductRecord, UniqueId};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use rusqlite::types::Type;

use crate::error::StorageError;
use crate::migrations;

/// Type alias for pooled connection
pub(crate) type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = "unique_id, platform, product_id, title, category, \
     url, image_url, current_price, current_rating, current_reviews, in_stock, first_seen, \
     last_seen, created_at, updated_at, times_scraped, price_history, rating_history, \
     lowest_price, highest_price, average_price, price_trend, price_change_percent";

/// Product storage backed by a pooled `SQLite` database.
#[derive(Clone, Debug)]
pub struct SqliteStorage {
    pub(crate) pool: Pool<SqliteConnectionManager>,
}

/// Get a connection from the pool
pub(crate) fn get_conn(pool: &Pool<SqliteConnectionManager>) -> Result<PooledConn, StorageError> {
    Ok(pool.get()?)
}

/// Format a timestamp as fixed-width RFC 3339 so text ordering is time ordering.
pub(crate) fn ts_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_ts(row: &rusqlite::Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_error(row.as_ref().column_index(column).unwrap_or(0), e))
}

/// Parse JSON from a text column, converting error to rusqlite error
fn parse_json<T: serde::de::DeserializeOwned>(
    row: &rusqlite::Row<'_>,
    column: &str,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| conversion_error(row.as_ref().column_index(column).unwrap_or(0), e))
}

/// Map a row selected with [`PRODUCT_COLUMNS`] to a `ProductRecord`.
pub(crate) fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProductRecord> {
    let platform: String = row.get("platform")?;
    let product_id: String = row.get("product_id")?;
    let unique_id = UniqueId::new(&platform, &product_id).map_err(|e| conversion_error(1, e))?;
    let trend_raw: String = row.get("price_trend")?;
    let price_trend = trend_raw.parse::<PriceTrend>().unwrap_or_else(|_| {
        tracing::warn!(
            invalid_trend = %trend_raw,
            "corrupt price_trend in DB, defaulting to stable"
        );
        PriceTrend::Stable
    });
    let times_scraped: i64 = row.get("times_scraped")?;

    Ok(ProductRecord {
        unique_id,
        platform,
        product_id,
        title: row.get("title")?,
        category: row.get("category")?,
        url: row.get("url")?,
        image_url: row.get("image_url")?,
        current_price: row.get("current_price")?,
        current_rating: row.get("current_rating")?,
        current_reviews: row.get("current_reviews")?,
        in_stock: row.get("in_stock")?,
        first_seen: parse_ts(row, "first_seen")?,
        last_seen: parse_ts(row, "last_seen")?,
        created_at: parse_ts(row, "created_at")?,
        updated_at: parse_ts(row, "updated_at")?,
        times_scraped: times_scraped.max(0) as u64,
        price_history: parse_json(row, "price_history")?,
        rating_history: parse_json(row, "rating_history")?,
        lowest_price: row.get("lowest_price")?,
        highest_price: row.get("highest_price")?,
        average_price: row.get("average_price")?,
        price_trend,
        price_change_percent: row.get("price_change_percent")?,
    })
}

/// Log row read errors and filter them out
pub(crate) fn log_row_error<T>(result: rusqlite::Result<T>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("Row read error: {}", e);
            None
        },
    }
}

/// Per-connection concurrency settings
fn init_connection(conn: &mut Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "PRAGMA busy_timeout = 30000;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

impl SqliteStorage {
    /// Open (creating if needed) the database at `db_path` and run migrations.
    pub fn new(db_path: &Path, pool_size: u32) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(db_path).with_init(init_connection);
        let pool = Pool::builder().max_size(pool_size.max(1)).build(manager)?;

        let conn = pool.get()?;
        migrations::run_migrations(&conn).map_err(|e| StorageError::Migration(e.to_string()))?;
        drop(conn);

        tracing::info!(
            pool_size = pool_size,
            path = %db_path.display(),
            "SQLite storage initialized with connection pool"
        );

        Ok(Self { pool })
    }
}
