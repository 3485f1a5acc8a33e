//! Shared constants for pricetrail.
//!
//! Centralizes defaults that are referenced from more than one crate.

/// Category assigned to a new record when the observation carries none.
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// Separator between platform and product id in a unique id.
pub const UNIQUE_ID_SEPARATOR: char = '_';

/// Upper bound of the rating scale (ratings are in `[0, RATING_SCALE_MAX]`).
pub const RATING_SCALE_MAX: f64 = 5.0;

/// Minimum `current_rating` for a record to count as trending.
pub const TRENDING_MIN_RATING: f64 = 4.0;

/// Default number of trending records returned.
pub const DEFAULT_TRENDING_LIMIT: usize = 10;

/// Default number of records returned by "all products" listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Default price-drop threshold, in percent.
pub const DEFAULT_PRICE_DROP_THRESHOLD: f64 = 10.0;

/// Maximum number of rows for the "all products" and trending listings.
pub const MAX_QUERY_LIMIT: usize = 1000;

/// PostgreSQL connection pool: maximum connections.
pub const PG_POOL_MAX_CONNECTIONS: u32 = 20;

/// PostgreSQL connection pool: acquire timeout in seconds.
pub const PG_POOL_ACQUIRE_TIMEOUT_SECS: u64 = 10;

/// PostgreSQL connection pool: idle timeout in seconds.
pub const PG_POOL_IDLE_TIMEOUT_SECS: u64 = 300;

/// Default SQLite connection pool size.
pub const DEFAULT_SQLITE_POOL_SIZE: u32 = 8;

/// Default bound on concurrently merged identities during bulk ingestion.
pub const DEFAULT_INGEST_WORKERS: usize = 8;

/// Default timeout for a single storage merge call, in seconds.
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 30;

/// Attempts at resolving a first-insert race before giving up.
pub const MAX_MERGE_ATTEMPTS: u32 = 3;
