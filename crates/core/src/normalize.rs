//! Normalization helpers for turning scraped listing text into observation fields.
//!
//! These never fail: text that cannot be interpreted yields `None`, which the
//! merge treats as "not extracted this time".

use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static FIRST_NUMBER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.?\d*)").unwrap());

#[allow(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static AMAZON_ASIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]{10})").unwrap());

#[allow(clippy::unwrap_used, reason = "static regex pattern is compile-time validated")]
static FLIPKART_ITEM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/p/([a-zA-Z0-9]+)").unwrap());

/// Parse a displayed price such as `"₹1,23,456"`, `"$999.99"` or `"1,299"`.
///
/// Both Indian (`1,23,456`) and Western (`123,456`) digit grouping are
/// accepted; grouping commas are dropped.
#[must_use]
pub fn parse_price_text(text: &str) -> Option<f64> {
    let cleaned = text.replace(['₹', '$'], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    let digits = cleaned.replace(',', "");
    digits.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}

/// Parse a displayed rating such as `"4.5 out of 5 stars"`.
///
/// The first number in the text is taken as the rating.
#[must_use]
pub fn parse_rating_text(text: &str) -> Option<f64> {
    FIRST_NUMBER_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Extract the platform-local product id from a listing URL.
///
/// Supports Amazon (`/dp/<ASIN>`) and Flipkart (`/p/<itm...>`); other
/// platforms return `None`.
#[must_use]
pub fn extract_product_id(url: &str, platform: &str) -> Option<String> {
    let regex = if platform.eq_ignore_ascii_case("amazon") {
        &AMAZON_ASIN_REGEX
    } else if platform.eq_ignore_ascii_case("flipkart") {
        &FLIPKART_ITEM_REGEX
    } else {
        return None;
    };
    regex.captures(url).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_owned())
}
