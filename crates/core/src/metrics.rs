//! Price analytics recomputed on every price-changing update.
//!
//! Statistics are unweighted over every recorded price point: a price that
//! held for a month counts the same as one that held for an hour.

use crate::{PricePoint, PriceTrend};

/// Direction and size of a single price change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMovement {
    pub trend: PriceTrend,
    pub change_percent: f64,
}

/// Recomputed price statistics for a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMetrics {
    pub lowest: f64,
    pub highest: f64,
    pub average: f64,
    /// `None` when there was no previous price to compare against; the
    /// record's trend and percent are then left as they were.
    pub movement: Option<PriceMovement>,
}

/// Classify the change from `old` to `new`.
///
/// Returns `None` for equal prices. Callers only invoke this after checking
/// `new != old`, so an equal-price observation never resets the trend to
/// stable: a record keeps the direction of its last real change.
///
/// A previous price of zero has no meaningful ratio; the direction is still
/// classified but the percent is reported as `0.0`.
#[must_use]
pub fn classify_change(old: f64, new: f64) -> Option<PriceMovement> {
    let trend = if new < old {
        PriceTrend::Down
    } else if new > old {
        PriceTrend::Up
    } else {
        return None;
    };
    let change_percent = if old == 0.0 { 0.0 } else { (new - old) * 100.0 / old };
    Some(PriceMovement { trend, change_percent })
}

/// Recompute min/max/mean over `history` and classify the latest change.
///
/// `history` must already contain the point for `new_price`. Returns `None`
/// only when `history` is empty.
#[must_use]
pub fn recompute_price_metrics(
    history: &[PricePoint],
    old_price: Option<f64>,
    new_price: f64,
) -> Option<PriceMetrics> {
    let first = history.first()?.value;
    let (lowest, highest, sum) = history.iter().fold((first, first, 0.0_f64), |acc, p| {
        (acc.0.min(p.value), acc.1.max(p.value), acc.2 + p.value)
    });
    #[allow(clippy::cast_precision_loss, reason = "history length is far below 2^52")]
    let average = sum / history.len() as f64;
    let movement = old_price.and_then(|old| classify_change(old, new_price));
    Some(PriceMetrics { lowest, highest, average, movement })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn history(values: &[f64]) -> Vec<PricePoint> {
        let start = Utc::now();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| PricePoint {
                timestamp: start + Duration::seconds(i64::try_from(i).unwrap()),
                value: *v,
            })
            .collect()
    }

    #[test]
    fn drop_is_classified_down_with_negative_percent() {
        let movement = classify_change(1000.0, 800.0).unwrap();
        assert_eq!(movement.trend, PriceTrend::Down);
        assert_eq!(movement.change_percent, -20.0);
    }

    #[test]
    fn rise_is_classified_up() {
        let movement = classify_change(800.0, 1000.0).unwrap();
        assert_eq!(movement.trend, PriceTrend::Up);
        assert_eq!(movement.change_percent, 25.0);
    }

    #[test]
    fn equal_price_leaves_trend_alone() {
        assert_eq!(classify_change(500.0, 500.0), None);
    }

    #[test]
    fn zero_base_price_reports_zero_percent() {
        let movement = classify_change(0.0, 10.0).unwrap();
        assert_eq!(movement.trend, PriceTrend::Up);
        assert_eq!(movement.change_percent, 0.0);
    }

    #[test]
    fn extremes_and_mean_cover_whole_history() {
        let points = history(&[1000.0, 800.0, 1200.0, 900.0]);
        let metrics = recompute_price_metrics(&points, Some(1200.0), 900.0).unwrap();
        assert_eq!(metrics.lowest, 800.0);
        assert_eq!(metrics.highest, 1200.0);
        assert_eq!(metrics.average, 975.0);
        assert_eq!(metrics.movement.unwrap().trend, PriceTrend::Down);
        assert_eq!(metrics.movement.unwrap().change_percent, -25.0);
    }

    #[test]
    fn no_previous_price_means_no_movement() {
        let points = history(&[42.0]);
        let metrics = recompute_price_metrics(&points, None, 42.0).unwrap();
        assert_eq!(metrics.lowest, 42.0);
        assert!(metrics.movement.is_none());
    }

    #[test]
    fn empty_history_yields_nothing() {
        assert!(recompute_price_metrics(&[], Some(1.0), 2.0).is_none());
    }
}
