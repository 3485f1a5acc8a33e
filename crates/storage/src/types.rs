//! Storage types shared across modules

use serde::{Deserialize, Serialize};

/// Aggregate statistics over the product collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ProductStats {
    /// Number of product records.
    pub total_products: u64,
    /// Distinct platforms, sorted.
    pub platforms: Vec<String>,
    /// Distinct categories, sorted.
    pub categories: Vec<String>,
    /// Records whose last price change was downwards.
    pub price_drops: u64,
    /// Records whose last price change was upwards.
    pub price_increases: u64,
}

impl ProductStats {
    #[must_use]
    pub const fn new(
        total_products: u64,
        platforms: Vec<String>,
        categories: Vec<String>,
        price_drops: u64,
        price_increases: u64,
    ) -> Self {
        Self { total_products, platforms, categories, price_drops, price_increases }
    }
}

/// Convert `usize` to `i64` for SQL LIMIT binds.
/// Saturates to `i64::MAX` on overflow (only possible on 128-bit targets).
pub(crate) fn usize_to_i64(val: usize) -> i64 {
    i64::try_from(val).unwrap_or(i64::MAX)
}

/// Convert a non-negative SQL count to `u64`, clamping corrupt negatives to zero.
pub(crate) fn count_to_u64(val: i64) -> u64 {
    u64::try_from(val).unwrap_or(0)
}
