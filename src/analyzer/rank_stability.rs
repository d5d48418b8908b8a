use crate::analyzer::outliers::remove_outliers;
use crate::analyzer::trend::calculate_trend;
use crate::config::{AnalysisConfig, RankConfig, RankShare};
use crate::model::{RankAnalysis, RankDetails, TimeSeriesPoint, TrendResult};
use crate::normalizer::values;
use crate::utils::{mean, sorted, sorted_quantile, std_dev};

/// Scores how consistently a listing holds a good sales rank.
///
/// Lower ranks are better. A listing that never gets under
/// `primary_threshold` is pinned to `never_ranked_score` however steady it is.
pub fn analyze_rank(points: &[TimeSeriesPoint], cfg: &AnalysisConfig) -> RankAnalysis {
    let rank_cfg = &cfg.rank;
    if points.len() < rank_cfg.min_points {
        return RankAnalysis::default();
    }

    let ranks = values(points);
    let trend = calculate_trend(&ranks, &cfg.trend);

    let avg = mean(&ranks);
    let sd = std_dev(&ranks);
    let cov = coefficient_of_variation(avg, sd);
    let filtered = remove_outliers(&ranks, &cfg.outliers);
    let filtered_cov = coefficient_of_variation(mean(&filtered), std_dev(&filtered));

    let under_primary = share_below(&ranks, rank_cfg.primary_threshold);
    let under_secondary = share_below(&ranks, rank_cfg.secondary_threshold);

    let mut details = RankDetails {
        mean: avg,
        std_dev: sd,
        cov,
        filtered_cov,
        percent_under_primary: under_primary,
        percent_under_secondary: under_secondary,
        hard_floor_applied: false,
        seasonal_bonus_applied: false,
    };

    if under_primary == 0.0 {
        details.hard_floor_applied = true;
        return finish(trend, rank_cfg.never_ranked_score, details);
    }

    let base = (1.0 - cov / rank_cfg.cov_divisor).max(0.0);
    let mut score = apply_tiers(base, under_primary, under_secondary, rank_cfg);

    if has_seasonal_improvement(&ranks, rank_cfg) {
        details.seasonal_bonus_applied = true;
        score += rank_cfg.seasonal_bonus;
    }

    finish(trend, score, details)
}

fn finish(trend: TrendResult, score: f64, details: RankDetails) -> RankAnalysis {
    let stability = score.clamp(0.0, 1.0);
    RankAnalysis {
        trend,
        stability,
        volatility: 1.0 - stability,
        details: Some(details),
        is_default: false,
    }
}

fn coefficient_of_variation(avg: f64, sd: f64) -> f64 {
    if avg == 0.0 { 0.0 } else { sd / avg }
}

/// Fraction of points strictly below `threshold` (point count, not time weighted).
fn share_below(ranks: &[f64], threshold: f64) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    ranks.iter().filter(|r| **r < threshold).count() as f64 / ranks.len() as f64
}

/// First matching tier lifts the score to its floor and adds its boost.
/// With no match the score is capped at `unranked_cap`.
pub fn apply_tiers(base: f64, under_primary: f64, under_secondary: f64, cfg: &RankConfig) -> f64 {
    let matched = cfg.tiers.iter().find(|tier| {
        let share = match tier.share {
            RankShare::UnderPrimary => under_primary,
            RankShare::UnderSecondary => under_secondary,
        };
        share > tier.above
    });

    match matched {
        Some(tier) => (base.max(tier.floor) + tier.boost).min(1.0),
        None => base.min(cfg.unranked_cap),
    }
}

/// A lower quartile far better than the median points at recurring good
/// seasons rather than noise.
fn has_seasonal_improvement(ranks: &[f64], cfg: &RankConfig) -> bool {
    if ranks.len() < cfg.seasonal_min_points {
        return false;
    }
    let ordered = sorted(ranks);
    let p25 = sorted_quantile(&ordered, 0.25);
    let median = sorted_quantile(&ordered, 0.5);
    p25 < median * cfg.seasonal_ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendDirection;
    use crate::utils::offset_to_datetime;

    fn series(ranks: &[f64]) -> Vec<TimeSeriesPoint> {
        ranks
            .iter()
            .enumerate()
            .map(|(i, &value)| TimeSeriesPoint {
                timestamp: offset_to_datetime(i as i64 * 1440).unwrap(),
                value,
            })
            .collect()
    }

    fn analyze(ranks: &[f64]) -> RankAnalysis {
        analyze_rank(&series(ranks), &AnalysisConfig::default())
    }

    #[test]
    fn too_few_points_fails_closed() {
        let result = analyze(&[1_000.0]);
        assert_eq!(result.stability, 0.0);
        assert_eq!(result.volatility, 1.0);
        assert_eq!(result.trend.direction, TrendDirection::Stable);
        assert_eq!(result.trend.confidence, 0.0);
        assert!(result.is_default);
    }

    #[test]
    fn never_under_primary_threshold_hits_hard_floor() {
        let result = analyze(&[100_000.0; 30]);
        assert_eq!(result.stability, 0.1);
        assert!((result.volatility - 0.9).abs() < 1e-12);
        assert!(result.details.unwrap().hard_floor_applied);

        let noisy: Vec<f64> = (0..30).map(|i| 50_000.0 + (i % 7) as f64 * 90_000.0).collect();
        assert_eq!(analyze(&noisy).stability, 0.1);
    }

    #[test]
    fn consistently_strong_rank_reaches_ceiling() {
        let ranks: Vec<f64> = (0..120).map(|i| 10_000.0 + (i % 3) as f64).collect();
        let result = analyze(&ranks);
        assert_eq!(result.stability, 1.0);
        assert_eq!(result.volatility, 0.0);
        assert!(!result.is_default);
    }

    #[test]
    fn tiers_are_first_match_wins() {
        let cfg = RankConfig::default();
        assert_eq!(apply_tiers(0.2, 0.96, 1.0, &cfg), 1.0);
        assert!((apply_tiers(0.2, 0.91, 1.0, &cfg) - 0.85).abs() < 1e-12);
        assert!((apply_tiers(0.2, 0.85, 1.0, &cfg) - 0.70).abs() < 1e-12);
        assert_eq!(apply_tiers(0.2, 0.70, 0.95, &cfg), 0.60);
        assert_eq!(apply_tiers(0.2, 0.60, 0.70, &cfg), 0.40);
        assert_eq!(apply_tiers(0.2, 0.40, 0.60, &cfg), 0.30);
        assert_eq!(apply_tiers(0.9, 0.40, 0.40, &cfg), 0.20);
        assert_eq!(apply_tiers(0.1, 0.40, 0.40, &cfg), 0.10);
    }

    #[test]
    fn boundary_shares_do_not_match() {
        let cfg = RankConfig::default();
        // exactly 0.95 falls through to the 0.90 tier
        assert!((apply_tiers(0.0, 0.95, 1.0, &cfg) - 0.85).abs() < 1e-12);
        assert_eq!(apply_tiers(0.0, 0.5, 0.5, &cfg), 0.0);
    }

    #[test]
    fn seasonal_bonus_lifts_capped_score() {
        // 40% of days at a strong rank, the rest mid-range
        let ranks: Vec<f64> = (0..100)
            .map(|i| if i % 5 < 2 { 4_000.0 } else { 400_000.0 })
            .collect();
        let result = analyze(&ranks);
        let details = result.details.unwrap();
        assert!(details.seasonal_bonus_applied);
        assert!((result.stability - 0.35).abs() < 1e-9);
    }

    #[test]
    fn short_series_gets_no_seasonal_bonus() {
        let ranks: Vec<f64> = (0..40)
            .map(|i| if i % 5 < 2 { 4_000.0 } else { 400_000.0 })
            .collect();
        let result = analyze(&ranks);
        assert!(!result.details.unwrap().seasonal_bonus_applied);
        assert!((result.stability - 0.2).abs() < 1e-9);
    }
}
