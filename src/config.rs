use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Provider channel indices inside a raw bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub rank: usize,
    pub price_primary: usize,
    pub price_fallbacks: Vec<usize>,
    pub sales: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            rank: 3,
            price_primary: 0,
            // new, new FBA, used; all (time, value) pairs
            price_fallbacks: vec![1, 10, 2],
            sales: 30,
        }
    }
}

impl ChannelConfig {
    /// Price channels in the order they are tried.
    pub fn price_candidates(&self) -> Vec<usize> {
        std::iter::once(self.price_primary)
            .chain(self.price_fallbacks.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub change_threshold: f64,
    pub confidence: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            change_threshold: 0.05,
            confidence: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    pub min_sample: usize,
    pub iqr_multiplier: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            min_sample: 5,
            iqr_multiplier: 1.5,
        }
    }
}

/// Which rank share a tier is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankShare {
    /// Fraction of points under `RankConfig::primary_threshold`.
    UnderPrimary,
    /// Fraction of points under `RankConfig::secondary_threshold`.
    UnderSecondary,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RankTier {
    pub share: RankShare,
    /// Tier matches when the share is strictly above this.
    pub above: f64,
    pub floor: f64,
    #[serde(default)]
    pub boost: f64,
}

impl RankTier {
    const fn new(share: RankShare, above: f64, floor: f64, boost: f64) -> Self {
        Self { share, above, floor, boost }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub min_points: usize,
    pub primary_threshold: f64,
    pub secondary_threshold: f64,
    /// Score returned when no point ever ranks under `primary_threshold`.
    pub never_ranked_score: f64,
    pub cov_divisor: f64,
    /// First match wins.
    pub tiers: Vec<RankTier>,
    /// Ceiling applied when no tier matches.
    pub unranked_cap: f64,
    pub seasonal_min_points: usize,
    pub seasonal_ratio: f64,
    pub seasonal_bonus: f64,
}

impl Default for RankConfig {
    fn default() -> Self {
        use RankShare::*;
        Self {
            min_points: 2,
            primary_threshold: 50_000.0,
            secondary_threshold: 100_000.0,
            never_ranked_score: 0.1,
            cov_divisor: 3.0,
            tiers: vec![
                RankTier::new(UnderPrimary, 0.95, 0.85, 0.15),
                RankTier::new(UnderPrimary, 0.90, 0.75, 0.10),
                RankTier::new(UnderPrimary, 0.80, 0.65, 0.05),
                RankTier::new(UnderSecondary, 0.90, 0.60, 0.0),
                RankTier::new(UnderPrimary, 0.50, 0.40, 0.0),
                RankTier::new(UnderSecondary, 0.50, 0.30, 0.0),
            ],
            unranked_cap: 0.20,
            seasonal_min_points: 60,
            seasonal_ratio: 0.5,
            seasonal_bonus: 0.15,
        }
    }
}

/// `(upper_bound, score)`: a ratio strictly below `upper_bound` scores `score`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RatioBand {
    pub below: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub minor_unit_divisor: f64,
    pub min_points: usize,
    pub default_stability: f64,
    pub grace_max_age_days: f64,
    pub grace_days: i64,
    pub grace_min_points: usize,
    pub sustained_days: i64,
    pub min_bucketed_points: usize,
    /// Score for a range ratio of exactly zero.
    pub flat_score: f64,
    /// Sorted ascending by `below`; first match wins.
    pub ratio_bands: Vec<RatioBand>,
    pub ratio_floor_score: f64,
    pub new_listing_days: f64,
    pub new_listing_boost: f64,
    pub new_listing_cap: f64,
    pub jitter_amplitude: f64,
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        let bands = [
            (0.01, 0.97),
            (0.03, 0.93),
            (0.05, 0.90),
            (0.10, 0.85),
            (0.15, 0.78),
            (0.20, 0.73),
            (0.25, 0.68),
            (0.30, 0.63),
            (0.40, 0.57),
            (0.50, 0.50),
            (0.75, 0.43),
        ];
        Self {
            minor_unit_divisor: 100.0,
            min_points: 2,
            default_stability: 0.65,
            grace_max_age_days: 365.0,
            grace_days: 30,
            grace_min_points: 5,
            sustained_days: 3,
            min_bucketed_points: 5,
            flat_score: 1.0,
            ratio_bands: bands
                .iter()
                .map(|&(below, score)| RatioBand { below, score })
                .collect(),
            ratio_floor_score: 0.35,
            new_listing_days: 90.0,
            new_listing_boost: 0.25,
            new_listing_cap: 0.95,
            jitter_amplitude: 0.015,
            jitter_min: 0.35,
            jitter_max: 0.99,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompetitiveConfig {
    pub max_score: f64,
    pub min_score: f64,
}

impl Default for CompetitiveConfig {
    fn default() -> Self {
        Self {
            max_score: 10.0,
            min_score: 1.0,
        }
    }
}

/// Every calibration constant used by the analyzers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub channels: ChannelConfig,
    pub trend: TrendConfig,
    pub outliers: OutlierConfig,
    pub rank: RankConfig,
    pub price: PriceConfig,
    pub competitive: CompetitiveConfig,
    /// Attach rank/price breakdowns to results.
    pub include_details: bool,
    /// Seed for the price jitter. Random per run when absent.
    pub jitter_seed: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Http {
        base_url: String,
        api_key: String,
        #[serde(default = "default_domain")]
        domain: u32,
        #[serde(default = "default_timeout")]
        timeout_seconds: u64,
    },
    File {
        path: String,
    },
}

fn default_domain() -> u32 {
    1
}

fn default_timeout() -> u64 {
    30
}

fn default_history_days() -> u32 {
    365
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub name: String,
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    #[serde(default = "default_history_days")]
    pub history_days: u32,
    pub batches: Vec<BatchConfig>,
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_analysis_section_keeps_defaults() {
        let raw = r#"{
            "provider": { "kind": "file", "path": "history.json" },
            "batches": [ { "name": "kitchen", "identifiers": ["B000000001"] } ],
            "analysis": { "price": { "default_stability": 0.5 }, "jitter_seed": 7 }
        }"#;
        let cfg: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.history_days, 365);
        assert_eq!(cfg.analysis.price.default_stability, 0.5);
        assert_eq!(cfg.analysis.price.grace_days, 30);
        assert_eq!(cfg.analysis.rank.primary_threshold, 50_000.0);
        assert_eq!(cfg.analysis.jitter_seed, Some(7));
        assert!(matches!(cfg.provider, ProviderConfig::File { .. }));
    }

    #[test]
    fn http_provider_defaults() {
        let raw = r#"{ "kind": "http", "base_url": "https://api.example.com", "api_key": "k" }"#;
        let provider: ProviderConfig = serde_json::from_str(raw).unwrap();
        match provider {
            ProviderConfig::Http { domain, timeout_seconds, .. } => {
                assert_eq!(domain, 1);
                assert_eq!(timeout_seconds, 30);
            }
            other => panic!("unexpected provider: {:?}", other),
        }
    }

    #[test]
    fn price_candidates_put_primary_first() {
        let channels = ChannelConfig::default();
        assert_eq!(channels.price_candidates(), vec![0, 1, 10, 2]);
    }

    #[test]
    fn ratio_bands_are_sorted() {
        let price = PriceConfig::default();
        assert!(price.ratio_bands.windows(2).all(|w| w[0].below < w[1].below));
        assert!(price.ratio_bands.windows(2).all(|w| w[0].score > w[1].score));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
