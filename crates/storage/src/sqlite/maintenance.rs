use super::{SqliteStorage, get_conn};
use crate::error::StorageError;
use crate::types::count_to_u64;

impl SqliteStorage {
    pub fn count_products(&self) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count_to_u64(count))
    }

    pub fn purge_unpriced(&self) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let deleted = conn.execute("DELETE FROM products WHERE current_price IS NULL", [])?;
        if deleted > 0 {
            tracing::info!(deleted, "Purged products without a current price");
        }
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }

    pub fn purge_all(&self) -> Result<u64, StorageError> {
        let conn = get_conn(&self.pool)?;
        let deleted = conn.execute("DELETE FROM products", [])?;
        tracing::warn!(deleted, "Deleted all product records");
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}
