use crate::config::OutlierConfig;
use crate::utils::{sorted, sorted_quantile};

/// Drops values outside `[Q1 - k*IQR, Q3 + k*IQR]`, keeping input order.
/// Samples smaller than `cfg.min_sample` are returned unchanged.
pub fn remove_outliers(values: &[f64], cfg: &OutlierConfig) -> Vec<f64> {
    if values.len() < cfg.min_sample {
        return values.to_vec();
    }

    let ordered = sorted(values);
    let q1 = sorted_quantile(&ordered, 0.25);
    let q3 = sorted_quantile(&ordered, 0.75);
    let iqr = q3 - q1;
    let lower = q1 - cfg.iqr_multiplier * iqr;
    let upper = q3 + cfg.iqr_multiplier * iqr;

    values
        .iter()
        .copied()
        .filter(|v| *v >= lower && *v <= upper)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_samples_pass_through() {
        let values = [1.0, 1000.0, 2.0, 3.0];
        assert_eq!(remove_outliers(&values, &OutlierConfig::default()), values.to_vec());
    }

    #[test]
    fn isolated_spike_is_removed() {
        let values = [10.0, 11.0, 12.0, 10.0, 11.0, 500.0, 12.0, 10.0];
        let filtered = remove_outliers(&values, &OutlierConfig::default());
        assert_eq!(filtered, vec![10.0, 11.0, 12.0, 10.0, 11.0, 12.0, 10.0]);
    }

    #[test]
    fn flat_series_is_kept_whole() {
        let values = [7.0; 6];
        assert_eq!(remove_outliers(&values, &OutlierConfig::default()).len(), 6);
    }
}
