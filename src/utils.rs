// Utility functions
use chrono::{DateTime, Duration, TimeZone, Utc};

/// Epoch of the provider's minute offsets (2011-01-01T00:00Z).
pub fn history_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Converts a provider minute offset into an absolute instant.
/// `None` when the offset is outside the representable range.
pub fn offset_to_datetime(offset_minutes: i64) -> Option<DateTime<Utc>> {
    Duration::try_minutes(offset_minutes).and_then(|d| history_epoch().checked_add_signed(d))
}

/// Inverse of [`offset_to_datetime`], truncated to whole minutes.
pub fn datetime_to_offset(ts: DateTime<Utc>) -> i64 {
    (ts - history_epoch()).num_minutes()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Sorted-order quantile: `sorted[floor(n * q)]`, no interpolation.
pub fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * q).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// `(max - min) / mean`, zero for empty or zero-mean input.
pub fn range_ratio(values: &[f64]) -> f64 {
    let avg = mean(values);
    if values.is_empty() || avg == 0.0 {
        return 0.0;
    }
    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    (max - min) / avg
}
