//! Scrape-time observations of a product listing.

mod builder;

pub use builder::*;

use serde::{Deserialize, Serialize};

use crate::constants::RATING_SCALE_MAX;

/// One extraction of a listing's attributes, as produced by a scraper.
///
/// `price` and `rating` are `None` when the scraper failed to extract them
/// this time; that is never the same thing as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Observation {
    /// Source platform, e.g. `amazon` or `flipkart`.
    #[serde(default)]
    pub platform: String,
    /// Platform-local product identifier (ASIN, FSN, ...).
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: Option<f64>,
    /// Rating on a 0 to 5 scale.
    #[serde(default)]
    pub rating: Option<f64>,
    /// Review count as displayed by the platform ("1,234 ratings").
    #[serde(default)]
    pub reviews: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Observation {
    /// Price usable for merging: finite and non-negative.
    #[must_use]
    pub fn valid_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p >= 0.0)
    }

    /// Rating usable for merging: finite and within the rating scale.
    #[must_use]
    pub fn valid_rating(&self) -> Option<f64> {
        self.rating.filter(|r| r.is_finite() && (0.0..=RATING_SCALE_MAX).contains(r))
    }

    /// Review text, ignoring empty strings.
    #[must_use]
    pub fn present_reviews(&self) -> Option<&str> {
        non_blank(self.reviews.as_deref())
    }

    /// Listing URL, ignoring empty strings.
    #[must_use]
    pub fn present_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    #[must_use]
    pub fn present_image_url(&self) -> Option<&str> {
        non_blank(self.image_url.as_deref())
    }

    #[must_use]
    pub fn present_category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_absent() {
        let obs: Observation =
            serde_json::from_str(r#"{"platform":"amazon","product_id":"X1","title":"Phone"}"#)
                .unwrap();
        assert_eq!(obs.price, None);
        assert_eq!(obs.rating, None);
        assert_eq!(obs.category, None);
    }

    #[test]
    fn explicit_null_price_is_absent_not_zero() {
        let obs: Observation = serde_json::from_str(
            r#"{"platform":"amazon","product_id":"X1","title":"Phone","price":null}"#,
        )
        .unwrap();
        assert_eq!(obs.valid_price(), None);
    }

    #[test]
    fn zero_price_is_kept() {
        let obs = Observation::builder("amazon", "X1", "Freebie").price(0.0).build();
        assert_eq!(obs.valid_price(), Some(0.0));
    }

    #[test]
    fn nonsensical_values_are_treated_as_not_extracted() {
        let obs = Observation::builder("amazon", "X1", "Phone")
            .price(f64::NAN)
            .rating(7.5)
            .build();
        assert_eq!(obs.valid_price(), None);
        assert_eq!(obs.valid_rating(), None);

        let negative = Observation::builder("amazon", "X1", "Phone").price(-1.0).build();
        assert_eq!(negative.valid_price(), None);
    }

    #[test]
    fn blank_strings_are_absent() {
        let obs = Observation::builder("amazon", "X1", "Phone").reviews("").url("  ").build();
        assert_eq!(obs.present_reviews(), None);
        assert_eq!(obs.present_url(), None);
    }
}
