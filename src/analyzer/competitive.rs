use crate::config::CompetitiveConfig;
use crate::model::{CompetitivePosition, TimeSeriesPoint};
use crate::normalizer::values;
use crate::utils::mean;

/// Log-scaled 1..10 strength proxy from the average rank. Zero when there is
/// no rank data.
pub fn competitive_position(rank: &[TimeSeriesPoint], cfg: &CompetitiveConfig) -> CompetitivePosition {
    if rank.is_empty() {
        return CompetitivePosition {
            score: 0.0,
            factors: vec!["Insufficient rank data".to_string()],
            is_default: true,
        };
    }

    let avg_rank = mean(&values(rank));
    let score = (cfg.max_score - avg_rank.log10()).clamp(cfg.min_score, cfg.max_score);

    CompetitivePosition {
        score,
        factors: vec![format!("Average rank: {}", avg_rank.round() as i64)],
        is_default: false,
    }
}
