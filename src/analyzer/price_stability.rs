use crate::analyzer::trend::calculate_trend;
use crate::config::{AnalysisConfig, PriceConfig};
use crate::model::{PriceAnalysis, PriceDetails, TimeSeriesPoint, TrendResult};
use crate::normalizer::values;
use crate::utils::range_ratio;
use chrono::Duration;
use rand::Rng;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Low-confidence placeholder returned when there is not enough price data.
pub fn default_price_analysis(cfg: &PriceConfig) -> PriceAnalysis {
    PriceAnalysis {
        trend: TrendResult::flat(),
        stability: cfg.default_stability,
        details: None,
        is_default: true,
    }
}

/// Scores how narrow a listing's sustained price range has been.
///
/// `points` are in major currency units. The final score carries a small
/// random perturbation drawn from `rng` whenever the range is non-zero.
pub fn analyze_price<R: Rng>(
    points: &[TimeSeriesPoint],
    cfg: &AnalysisConfig,
    rng: &mut R,
) -> PriceAnalysis {
    let price_cfg = &cfg.price;
    let positive: Vec<TimeSeriesPoint> = points.iter().filter(|p| p.value > 0.0).copied().collect();
    if positive.len() < price_cfg.min_points {
        return default_price_analysis(price_cfg);
    }

    let age_days = listing_age_days(&positive);
    let (graced, grace_period_applied) = apply_grace_period(&positive, age_days, price_cfg);

    let buckets = bucket_sustained_prices(&graced, price_cfg);
    let bucketing_used = buckets.points.len() >= price_cfg.min_bucketed_points;
    let scored = if bucketing_used { buckets.points } else { graced };

    let scored_values = values(&scored);
    let ratio = range_ratio(&scored_values);
    let base_score = ratio_score(ratio, price_cfg);

    let mut score = base_score;
    let mut new_listing_boost = 0.0;
    if age_days < price_cfg.new_listing_days {
        new_listing_boost = (price_cfg.new_listing_boost
            - (age_days / price_cfg.new_listing_days) * price_cfg.new_listing_boost)
            .max(0.0);
        score = (score + new_listing_boost).min(price_cfg.new_listing_cap);
    }

    let mut jitter = 0.0;
    if ratio > 0.0 {
        let amplitude = price_cfg.jitter_amplitude;
        if amplitude > 0.0 {
            jitter = rng.random_range(-amplitude..=amplitude);
        }
        score = (score + jitter).clamp(price_cfg.jitter_min, price_cfg.jitter_max);
    }

    PriceAnalysis {
        trend: calculate_trend(&scored_values, &cfg.trend),
        stability: score.clamp(0.0, 1.0),
        details: Some(PriceDetails {
            listing_age_days: age_days,
            grace_period_applied,
            points_analyzed: scored.len(),
            sustained_buckets: buckets.sustained,
            collapsed_buckets: buckets.collapsed,
            bucketing_used,
            raw_range_ratio: range_ratio(&values(&positive)),
            price_range_ratio: ratio,
            base_score,
            new_listing_boost,
            jitter,
        }),
        is_default: false,
    }
}

/// Days between the oldest and newest point of a sorted series.
fn listing_age_days(points: &[TimeSeriesPoint]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => {
            (last.timestamp - first.timestamp).num_seconds() as f64 / SECONDS_PER_DAY
        }
        _ => 0.0,
    }
}

/// Drops the launch window of young listings unless too little would remain.
fn apply_grace_period(
    points: &[TimeSeriesPoint],
    age_days: f64,
    cfg: &PriceConfig,
) -> (Vec<TimeSeriesPoint>, bool) {
    let Some(oldest) = points.first() else {
        return (Vec::new(), false);
    };
    if age_days >= cfg.grace_max_age_days {
        return (points.to_vec(), false);
    }

    let cutoff = oldest.timestamp + Duration::days(cfg.grace_days);
    let kept: Vec<TimeSeriesPoint> = points.iter().filter(|p| p.timestamp >= cutoff).copied().collect();
    if kept.len() < cfg.grace_min_points {
        return (points.to_vec(), false);
    }
    (kept, true)
}

#[derive(Debug, Default)]
pub struct BucketOutcome {
    pub points: Vec<TimeSeriesPoint>,
    pub sustained: usize,
    pub collapsed: usize,
}

/// Groups points by whole-unit price. A bucket where two consecutive points
/// sit at least `sustained_days` apart is a real price level and kept whole;
/// any other multi-point bucket is a transient and shrinks to its
/// median-timestamp point.
pub fn bucket_sustained_prices(points: &[TimeSeriesPoint], cfg: &PriceConfig) -> BucketOutcome {
    let mut buckets: BTreeMap<i64, Vec<TimeSeriesPoint>> = BTreeMap::new();
    for point in points {
        buckets.entry(point.value.round() as i64).or_default().push(*point);
    }

    let window = Duration::days(cfg.sustained_days);
    let mut outcome = BucketOutcome::default();
    for (_, mut bucket) in buckets {
        if bucket.len() < 2 {
            outcome.points.extend(bucket);
            continue;
        }
        bucket.sort_by_key(|p| p.timestamp);
        let sustained = bucket
            .windows(2)
            .any(|w| w[1].timestamp - w[0].timestamp >= window);
        if sustained {
            outcome.sustained += 1;
            outcome.points.extend(bucket);
        } else {
            outcome.collapsed += 1;
            outcome.points.push(bucket[bucket.len() / 2]);
        }
    }

    outcome.points.sort_by_key(|p| p.timestamp);
    outcome
}

/// Maps a range ratio to a base score via the configured bands.
pub fn ratio_score(ratio: f64, cfg: &PriceConfig) -> f64 {
    if ratio == 0.0 {
        return cfg.flat_score;
    }
    cfg.ratio_bands
        .iter()
        .find(|band| ratio < band.below)
        .map(|band| band.score)
        .unwrap_or(cfg.ratio_floor_score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendDirection;
    use crate::utils::offset_to_datetime;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const HOUR: i64 = 60;
    const DAY: i64 = 24 * HOUR;

    fn point(minutes: i64, value: f64) -> TimeSeriesPoint {
        TimeSeriesPoint {
            timestamp: offset_to_datetime(minutes).unwrap(),
            value,
        }
    }

    fn daily(days: i64, price: impl Fn(i64) -> f64) -> Vec<TimeSeriesPoint> {
        (0..=days).map(|d| point(d * DAY, price(d))).collect()
    }

    fn analyze(points: &[TimeSeriesPoint]) -> PriceAnalysis {
        analyze_price(points, &AnalysisConfig::default(), &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn sparse_series_returns_flagged_default() {
        for points in [vec![], vec![point(0, 12.5)], vec![point(0, 0.0), point(DAY, 9.0)]] {
            let result = analyze(&points);
            assert_eq!(result.stability, 0.65);
            assert_eq!(result.trend.direction, TrendDirection::Stable);
            assert_eq!(result.trend.strength, 0.0);
            assert!(result.is_default);
            assert!(result.details.is_none());
        }
    }

    #[test]
    fn flat_price_is_exactly_stable() {
        let points = daily(100, |_| 19.99);
        let result = analyze(&points);
        assert_eq!(result.stability, 1.0);
        let details = result.details.unwrap();
        assert_eq!(details.price_range_ratio, 0.0);
        assert_eq!(details.jitter, 0.0);
        assert!(details.grace_period_applied);
        assert!(!result.is_default);
    }

    #[test]
    fn young_flat_listing_is_capped_by_boost() {
        let points = daily(45, |_| 19.99);
        let result = analyze(&points);
        // 1.0 + 0.125 boost, capped
        assert_eq!(result.stability, 0.95);
        assert!((result.details.unwrap().new_listing_boost - 0.125).abs() < 1e-9);
    }

    #[test]
    fn launch_pricing_is_ignored_for_young_listings() {
        let launch_then_flat = |d: i64| if d < 30 { 10.0 } else { 20.0 };

        let young = analyze(&daily(200, launch_then_flat));
        assert_eq!(young.stability, 1.0);
        assert!(young.details.unwrap().grace_period_applied);

        let old = analyze(&daily(400, launch_then_flat));
        let details = old.details.unwrap();
        assert!(!details.grace_period_applied);
        assert!(details.price_range_ratio > 0.0);
        assert!(old.stability < 0.9);
    }

    #[test]
    fn grace_period_reverts_when_too_few_points_remain() {
        // five points in the first month, one afterwards
        let mut points: Vec<TimeSeriesPoint> = (0..5).map(|d| point(d * DAY, 10.0)).collect();
        points.push(point(40 * DAY, 10.0));
        let result = analyze(&points);
        assert!(!result.details.unwrap().grace_period_applied);
    }

    #[test]
    fn buckets_keep_sustained_levels_and_collapse_spikes() {
        let points = vec![
            point(0, 10.2),
            point(DAY, 20.0),
            point(2 * DAY, 19.8),
            point(3 * DAY, 30.0),
            point(5 * DAY, 9.9),
        ];
        let outcome = bucket_sustained_prices(&points, &PriceConfig::default());
        assert_eq!(outcome.sustained, 1);
        assert_eq!(outcome.collapsed, 1);
        let kept: Vec<f64> = values(&outcome.points);
        assert_eq!(kept, vec![10.2, 19.8, 30.0, 9.9]);
    }

    #[test]
    fn ratio_bands_match_lookup_table() {
        let cfg = PriceConfig::default();
        let cases = [
            (0.0, 1.0),
            (0.005, 0.97),
            (0.01, 0.93),
            (0.04, 0.90),
            (0.09, 0.85),
            (0.12, 0.78),
            (0.19, 0.73),
            (0.24, 0.68),
            (0.29, 0.63),
            (0.35, 0.57),
            (0.45, 0.50),
            (0.60, 0.43),
            (0.75, 0.35),
            (3.0, 0.35),
        ];
        for (ratio, expected) in cases {
            assert_eq!(ratio_score(ratio, &cfg), expected, "ratio {}", ratio);
        }
    }

    fn weekly_alternating() -> Vec<TimeSeriesPoint> {
        (0..58)
            .map(|w| point(w * 7 * DAY, if w % 2 == 0 { 20.0 } else { 21.0 }))
            .collect()
    }

    #[test]
    fn jitter_stays_within_amplitude_and_is_seedable() {
        let points = weekly_alternating();
        let cfg = AnalysisConfig::default();

        let first = analyze_price(&points, &cfg, &mut StdRng::seed_from_u64(99));
        let second = analyze_price(&points, &cfg, &mut StdRng::seed_from_u64(99));
        assert_eq!(first, second);

        let details = first.details.unwrap();
        assert!(details.bucketing_used);
        assert_eq!(details.sustained_buckets, 2);
        assert_eq!(details.base_score, 0.90);
        assert!((first.stability - 0.90).abs() <= 0.015 + 1e-12);
    }

    #[test]
    fn zero_amplitude_disables_jitter() {
        let mut cfg = AnalysisConfig::default();
        cfg.price.jitter_amplitude = 0.0;
        let result = analyze_price(&weekly_alternating(), &cfg, &mut StdRng::seed_from_u64(5));
        assert_eq!(result.stability, 0.90);
    }

    #[test]
    fn bucketing_shrinks_range_of_churning_prices() {
        // 180 days, a point every 4 hours. Prices flip every observation
        // around $10 with a two-day climb through $20..$50.
        let points: Vec<TimeSeriesPoint> = (0..1080)
            .map(|i| {
                let price = if (720..732).contains(&i) {
                    let level = 20.0 + ((i - 720) / 3) as f64 * 10.0;
                    level + [0.0, 0.3, -0.2][(i % 3) as usize]
                } else if i % 2 == 0 {
                    10.0
                } else {
                    10.4
                };
                point(i * 4 * HOUR, price)
            })
            .collect();

        let result = analyze(&points);
        let details = result.details.unwrap();
        assert!(details.bucketing_used);
        assert_eq!(details.points_analyzed, 5);
        assert_eq!(details.sustained_buckets, 0);
        assert!(details.price_range_ratio < details.raw_range_ratio * 0.5);
    }
}
