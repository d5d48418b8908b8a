use crate::model::TimeSeriesPoint;
use crate::utils::offset_to_datetime;

/// Decodes a flat `(offset, value, offset, value, ...)` channel into points
/// sorted by timestamp.
///
/// Pairs with a negative offset or value are missing observations and are
/// skipped, as are offsets too large to represent. An odd trailing element is
/// ignored.
pub fn decode_series(encoded: Option<&[i64]>) -> Vec<TimeSeriesPoint> {
    let Some(encoded) = encoded else {
        return Vec::new();
    };

    let mut points: Vec<TimeSeriesPoint> = encoded
        .chunks_exact(2)
        .filter(|pair| pair[0] >= 0 && pair[1] >= 0)
        .filter_map(|pair| {
            offset_to_datetime(pair[0]).map(|timestamp| TimeSeriesPoint {
                timestamp,
                value: pair[1] as f64,
            })
        })
        .collect();

    points.sort_by_key(|p| p.timestamp);
    points
}

/// Rescales decoded values, e.g. minor currency units to major ones.
pub fn scale_values(points: &[TimeSeriesPoint], divisor: f64) -> Vec<TimeSeriesPoint> {
    points
        .iter()
        .map(|p| TimeSeriesPoint {
            timestamp: p.timestamp,
            value: p.value / divisor,
        })
        .collect()
}

pub fn values(points: &[TimeSeriesPoint]) -> Vec<f64> {
    points.iter().map(|p| p.value).collect()
}
