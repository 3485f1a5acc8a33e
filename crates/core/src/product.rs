//! Canonical product records and their history points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Observation, UniqueId};

/// Direction of the most recent price change.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrend {
    /// No price change observed yet.
    #[default]
    Stable,
    Up,
    Down,
}

impl PriceTrend {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::str::FromStr for PriceTrend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stable" => Ok(Self::Stable),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(format!("unknown price trend: {other}")),
        }
    }
}

impl std::fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A price observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A rating observed at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// The single durable record unifying every observation of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub unique_id: UniqueId,
    pub platform: String,
    pub product_id: String,
    pub title: String,
    pub category: String,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub current_price: Option<f64>,
    pub current_rating: Option<f64>,
    pub current_reviews: Option<String>,
    pub in_stock: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub times_scraped: u64,
    /// Ordered by timestamp; one point per distinct consecutive price.
    pub price_history: Vec<PricePoint>,
    /// Ordered by timestamp; one point per distinct consecutive rating.
    pub rating_history: Vec<RatingPoint>,
    pub lowest_price: Option<f64>,
    pub highest_price: Option<f64>,
    pub average_price: Option<f64>,
    pub price_trend: PriceTrend,
    pub price_change_percent: f64,
}

impl ProductRecord {
    /// Whether `obs` describes this product (same platform and product id).
    ///
    /// Distinct pairs can collide on the joined key (`a_b` + `c` vs `a` +
    /// `b_c`); storage refuses to merge across such a collision.
    #[must_use]
    pub fn is_same_product(&self, obs: &Observation) -> bool {
        self.platform == obs.platform && self.product_id == obs.product_id
    }
}

/// Which branch of the merge a call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeAction {
    Inserted,
    Updated,
}

impl MergeAction {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Updated => "updated",
        }
    }
}

/// Result of a successful merge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    pub action: MergeAction,
    pub unique_id: UniqueId,
}

impl MergeOutcome {
    #[must_use]
    pub const fn new(action: MergeAction, unique_id: UniqueId) -> Self {
        Self { action, unique_id }
    }
}
