//! Read-only product queries.

use pricetrail_core::ProductRecord;
use rusqlite::{Connection, Params};

use super::{PRODUCT_COLUMNS, SqliteStorage, get_conn, log_row_error, row_to_product};
use crate::error::StorageError;
use crate::types::{ProductStats, count_to_u64, usize_to_i64};

/// SQLite reads a negative `LIMIT` as unbounded.
fn optional_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, usize_to_i64)
}

fn query_products<P: Params>(
    conn: &Connection,
    filter_and_order: &str,
    params: P,
) -> Result<Vec<ProductRecord>, StorageError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products {filter_and_order}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params, row_to_product)?;
    Ok(rows.filter_map(log_row_error).collect())
}

fn distinct_values(conn: &Connection, column: &str) -> Result<Vec<String>, StorageError> {
    let sql = format!("SELECT DISTINCT {column} FROM products ORDER BY {column}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    Ok(rows.filter_map(log_row_error).collect())
}

impl SqliteStorage {
    pub fn products_by_platform(
        &self,
        platform: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_products(
            &conn,
            "WHERE platform = ?1 ORDER BY updated_at DESC LIMIT ?2",
            rusqlite::params![platform, optional_limit(limit)],
        )
    }

    pub fn products_by_category(
        &self,
        category: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_products(
            &conn,
            "WHERE category = ?1 ORDER BY updated_at DESC LIMIT ?2",
            rusqlite::params![category, optional_limit(limit)],
        )
    }

    pub fn recent_products(&self, limit: usize) -> Result<Vec<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_products(&conn, "ORDER BY updated_at DESC LIMIT ?1", [usize_to_i64(limit)])
    }

    pub fn trending_products(
        &self,
        min_rating: f64,
        limit: usize,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_products(
            &conn,
            "WHERE current_rating >= ?1 ORDER BY current_rating DESC, last_seen DESC LIMIT ?2",
            rusqlite::params![min_rating, usize_to_i64(limit)],
        )
    }

    pub fn price_drops(
        &self,
        threshold_percent: f64,
        limit: Option<usize>,
    ) -> Result<Vec<ProductRecord>, StorageError> {
        let conn = get_conn(&self.pool)?;
        query_products(
            &conn,
            "WHERE price_trend = 'down' AND price_change_percent < ?1
             ORDER BY price_change_percent ASC LIMIT ?2",
            rusqlite::params![-threshold_percent, optional_limit(limit)],
        )
    }

    pub fn product_stats(&self) -> Result<ProductStats, StorageError> {
        let conn = get_conn(&self.pool)?;
        let (total, drops, increases): (i64, i64, i64) = conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(price_trend = 'down'), 0),
                    COALESCE(SUM(price_trend = 'up'), 0)
             FROM products",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(ProductStats::new(
            count_to_u64(total),
            distinct_values(&conn, "platform")?,
            distinct_values(&conn, "category")?,
            count_to_u64(drops),
            count_to_u64(increases),
        ))
    }
}
