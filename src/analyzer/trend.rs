use crate::config::TrendConfig;
use crate::model::{TrendDirection, TrendResult};
use crate::utils::mean;

/// Compares the average of the first half of `values` with the second half.
///
/// On odd lengths the first half takes the middle element. A relative change
/// exactly equal to the threshold is still `Stable`.
pub fn calculate_trend(values: &[f64], cfg: &TrendConfig) -> TrendResult {
    if values.len() < 2 {
        return TrendResult::flat();
    }

    let mid = values.len().div_ceil(2);
    let avg_first = mean(&values[..mid]);
    let avg_second = mean(&values[mid..]);

    if avg_first == 0.0 {
        return TrendResult {
            direction: TrendDirection::Stable,
            strength: 0.0,
            confidence: cfg.confidence,
        };
    }

    let change = (avg_second - avg_first) / avg_first;
    let direction = if change > cfg.change_threshold {
        TrendDirection::Up
    } else if change < -cfg.change_threshold {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    TrendResult {
        direction,
        strength: change.abs().min(1.0),
        confidence: cfg.confidence,
    }
}
