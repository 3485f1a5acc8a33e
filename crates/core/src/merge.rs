//! Pure merge computation: observation + existing record → new record state.
//!
//! Storage backends call into this inside their per-identity transaction so
//! the field policy lives in one place and backends only handle I/O.

use chrono::{DateTime, Utc};

use crate::constants::DEFAULT_CATEGORY;
use crate::metrics::recompute_price_metrics;
use crate::{
    MergeAction, Observation, PricePoint, PriceTrend, ProductRecord, RatingPoint, UniqueId,
};

/// What an update actually changed beyond the bookkeeping fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateEffects {
    /// A price point was appended and metrics were recomputed.
    pub price_changed: bool,
    /// A rating point was appended.
    pub rating_changed: bool,
}

/// Build the first record for an identity from its first observation.
#[must_use]
pub fn new_record(unique_id: UniqueId, obs: &Observation, now: DateTime<Utc>) -> ProductRecord {
    let price = obs.valid_price();
    let rating = obs.valid_rating();

    ProductRecord {
        unique_id,
        platform: obs.platform.clone(),
        product_id: obs.product_id.clone(),
        title: obs.title.clone(),
        category: obs.present_category().unwrap_or(DEFAULT_CATEGORY).to_owned(),
        url: obs.present_url().map(ToOwned::to_owned),
        image_url: obs.present_image_url().map(ToOwned::to_owned),
        current_price: price,
        current_rating: rating,
        current_reviews: obs.present_reviews().map(ToOwned::to_owned),
        in_stock: true,
        first_seen: now,
        last_seen: now,
        created_at: now,
        updated_at: now,
        times_scraped: 1,
        price_history: price
            .map(|value| PricePoint { timestamp: now, value })
            .into_iter()
            .collect(),
        rating_history: rating
            .map(|value| RatingPoint { timestamp: now, value })
            .into_iter()
            .collect(),
        lowest_price: price,
        highest_price: price,
        average_price: price,
        price_trend: PriceTrend::Stable,
        price_change_percent: 0.0,
    }
}

/// Apply a later observation of the same identity to `record`.
///
/// Absent values never erase known-good ones. History points are appended
/// only when the value differs from the current one. `now` is clamped to the
/// record's `last_seen` so history timestamps never go backwards.
pub fn apply_observation(
    record: &mut ProductRecord,
    obs: &Observation,
    now: DateTime<Utc>,
) -> UpdateEffects {
    let now = now.max(record.last_seen);
    let mut effects = UpdateEffects::default();

    record.last_seen = now;
    record.updated_at = now;
    record.times_scraped = record.times_scraped.saturating_add(1);

    if let Some(new_price) = obs.valid_price() {
        if record.current_price != Some(new_price) {
            let old_price = record.current_price;
            record.price_history.push(PricePoint { timestamp: now, value: new_price });
            record.current_price = Some(new_price);
            if let Some(metrics) =
                recompute_price_metrics(&record.price_history, old_price, new_price)
            {
                record.lowest_price = Some(metrics.lowest);
                record.highest_price = Some(metrics.highest);
                record.average_price = Some(metrics.average);
                if let Some(movement) = metrics.movement {
                    record.price_trend = movement.trend;
                    record.price_change_percent = movement.change_percent;
                }
            }
            effects.price_changed = true;
        }
    }

    if let Some(new_rating) = obs.valid_rating() {
        if record.current_rating != Some(new_rating) {
            record.rating_history.push(RatingPoint { timestamp: now, value: new_rating });
            record.current_rating = Some(new_rating);
            effects.rating_changed = true;
        }
    }

    if let Some(reviews) = obs.present_reviews() {
        record.current_reviews = Some(reviews.to_owned());
    }
    if let Some(url) = obs.present_url() {
        record.url = Some(url.to_owned());
    }

    effects
}

/// Insert-or-update dispatch over an optional existing record.
#[must_use]
pub fn merge_observation(
    existing: Option<ProductRecord>,
    unique_id: &UniqueId,
    obs: &Observation,
    now: DateTime<Utc>,
) -> (ProductRecord, MergeAction, UpdateEffects) {
    match existing {
        Some(mut record) => {
            let effects = apply_observation(&mut record, obs, now);
            (record, MergeAction::Updated, effects)
        },
        None => {
            let record = new_record(unique_id.clone(), obs, now);
            let effects = UpdateEffects {
                price_changed: record.current_price.is_some(),
                rating_changed: record.current_rating.is_some(),
            };
            (record, MergeAction::Inserted, effects)
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::resolve_identity;

    fn obs(price: Option<f64>) -> Observation {
        Observation::builder("amazon", "X1", "Phone").maybe_price(price).build()
    }

    fn merge_all(observations: &[Observation]) -> ProductRecord {
        let start = Utc::now();
        let mut current = None;
        for (i, o) in observations.iter().enumerate() {
            let id = resolve_identity(o).unwrap();
            let now = start + Duration::seconds(i64::try_from(i).unwrap());
            let (record, _, _) = merge_observation(current.take(), &id, o, now);
            current = Some(record);
        }
        current.unwrap()
    }

    #[test]
    fn insert_seeds_price_history_and_metrics() {
        let record = merge_all(&[obs(Some(1000.0))]);
        assert_eq!(record.unique_id.as_str(), "amazon_X1");
        assert_eq!(record.current_price, Some(1000.0));
        assert_eq!(record.lowest_price, Some(1000.0));
        assert_eq!(record.highest_price, Some(1000.0));
        assert_eq!(record.average_price, Some(1000.0));
        assert_eq!(record.price_trend, PriceTrend::Stable);
        assert_eq!(record.price_change_percent, 0.0);
        assert_eq!(record.times_scraped, 1);
        assert_eq!(record.price_history.len(), 1);
        assert_eq!(record.first_seen, record.last_seen);
        assert_eq!(record.created_at, record.updated_at);
        assert!(record.in_stock);
    }

    #[test]
    fn insert_without_price_leaves_metrics_unset() {
        let record = merge_all(&[obs(None)]);
        assert_eq!(record.current_price, None);
        assert!(record.price_history.is_empty());
        assert_eq!(record.lowest_price, None);
        assert_eq!(record.average_price, None);
        assert_eq!(record.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn drop_then_repeat_matches_reference_scenario() {
        let after_b = merge_all(&[obs(Some(1000.0)), obs(Some(800.0))]);
        assert_eq!(after_b.current_price, Some(800.0));
        assert_eq!(after_b.lowest_price, Some(800.0));
        assert_eq!(after_b.highest_price, Some(1000.0));
        assert_eq!(after_b.average_price, Some(900.0));
        assert_eq!(after_b.price_trend, PriceTrend::Down);
        assert_eq!(after_b.price_change_percent, -20.0);
        assert_eq!(after_b.times_scraped, 2);
        let values: Vec<f64> = after_b.price_history.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1000.0, 800.0]);

        let after_c = merge_all(&[obs(Some(1000.0)), obs(Some(800.0)), obs(Some(800.0))]);
        assert_eq!(after_c.times_scraped, 3);
        assert_eq!(after_c.price_history.len(), 2);
        assert_eq!(after_c.price_trend, PriceTrend::Down);
        assert_eq!(after_c.price_change_percent, -20.0);
        assert_eq!(after_c.average_price, Some(900.0));
    }

    #[test]
    fn missing_price_never_erases_known_price() {
        let record = merge_all(&[obs(Some(499.0)), obs(None)]);
        assert_eq!(record.current_price, Some(499.0));
        assert_eq!(record.price_history.len(), 1);
        assert_eq!(record.times_scraped, 2);
    }

    #[test]
    fn first_price_after_priceless_insert_keeps_trend() {
        let record = merge_all(&[obs(None), obs(Some(250.0))]);
        assert_eq!(record.current_price, Some(250.0));
        assert_eq!(record.lowest_price, Some(250.0));
        assert_eq!(record.highest_price, Some(250.0));
        assert_eq!(record.price_trend, PriceTrend::Stable);
        assert_eq!(record.price_change_percent, 0.0);
    }

    #[test]
    fn rising_price_after_drop_moves_trend_up_and_never_back_to_stable() {
        let record =
            merge_all(&[obs(Some(100.0)), obs(Some(80.0)), obs(Some(120.0)), obs(Some(120.0))]);
        assert_eq!(record.price_trend, PriceTrend::Up);
        assert_eq!(record.price_change_percent, 50.0);
        assert_eq!(record.lowest_price, Some(80.0));
        assert_eq!(record.highest_price, Some(120.0));
        assert_eq!(record.average_price, Some(100.0));
    }

    #[test]
    fn rating_history_appends_only_on_change() {
        let o = |r: f64| Observation::builder("flipkart", "itm1", "Kettle").rating(r).build();
        let record = merge_all(&[o(4.1), o(4.1), o(4.3)]);
        assert_eq!(record.current_rating, Some(4.3));
        let values: Vec<f64> = record.rating_history.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![4.1, 4.3]);
    }

    #[test]
    fn partial_overwrite_of_reviews_and_url() {
        let first = Observation::builder("amazon", "X1", "Phone")
            .reviews("1,024 ratings")
            .url("https://example.com/a")
            .category("phones")
            .build();
        let second = Observation::builder("amazon", "X1", "Phone (renamed)")
            .reviews("")
            .url("https://example.com/b")
            .category("other")
            .build();
        let record = merge_all(&[first, second]);
        assert_eq!(record.current_reviews.as_deref(), Some("1,024 ratings"));
        assert_eq!(record.url.as_deref(), Some("https://example.com/b"));
        assert_eq!(record.title, "Phone");
        assert_eq!(record.category, "phones");
    }

    #[test]
    fn clock_going_backwards_does_not_reorder_history() {
        let id = UniqueId::new("amazon", "X1").unwrap();
        let t0 = Utc::now();
        let (mut record, _, _) = merge_observation(None, &id, &obs(Some(10.0)), t0);
        let earlier = t0 - Duration::seconds(30);
        let effects = apply_observation(&mut record, &obs(Some(12.0)), earlier);
        assert!(effects.price_changed);
        assert!(record.price_history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(record.last_seen, t0);
    }
}
