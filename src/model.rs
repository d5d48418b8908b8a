// Core structs: series points, analysis records, raw bundles and error types
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single decoded observation. Only the normalizer builds these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Raw history for one listing as delivered by the history provider.
///
/// `channels[i]` is the flat `(offset, value, offset, value, ...)` encoding of
/// channel `i`, or `None` when the provider has no data for that channel.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChannelBundle {
    #[serde(rename = "asin")]
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "csv", default)]
    pub channels: Vec<Option<Vec<i64>>>,
    /// Set when the provider returned this listing but its history could not
    /// be decoded. `channels` is empty in that case.
    #[serde(skip)]
    pub decode_error: Option<String>,
}

impl RawChannelBundle {
    /// Placeholder for a listing whose history failed to decode.
    pub fn undecodable(identifier: String, title: Option<String>, reason: String) -> Self {
        Self {
            identifier,
            title,
            channels: Vec::new(),
            decode_error: Some(reason),
        }
    }

    pub fn channel(&self, index: usize) -> Option<&[i64]> {
        self.channels.get(index).and_then(|c| c.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub direction: TrendDirection,
    pub strength: f64,
    pub confidence: f64,
}

impl TrendResult {
    pub fn flat() -> Self {
        Self {
            direction: TrendDirection::Stable,
            strength: 0.0,
            confidence: 0.0,
        }
    }
}

/// Breakdown of the inputs behind a rank stability score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankDetails {
    pub mean: f64,
    pub std_dev: f64,
    pub cov: f64,
    /// Coefficient of variation after IQR outlier removal. Informational only.
    pub filtered_cov: f64,
    pub percent_under_primary: f64,
    pub percent_under_secondary: f64,
    pub hard_floor_applied: bool,
    pub seasonal_bonus_applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankAnalysis {
    pub trend: TrendResult,
    pub stability: f64,
    pub volatility: f64,
    pub details: Option<RankDetails>,
    pub is_default: bool,
}

impl Default for RankAnalysis {
    fn default() -> Self {
        Self {
            trend: TrendResult::flat(),
            stability: 0.0,
            volatility: 1.0,
            details: None,
            is_default: true,
        }
    }
}

/// Breakdown of the inputs behind a price stability score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDetails {
    pub listing_age_days: f64,
    pub grace_period_applied: bool,
    pub points_analyzed: usize,
    pub sustained_buckets: usize,
    pub collapsed_buckets: usize,
    pub bucketing_used: bool,
    /// `(max - min) / mean` of the unfiltered positive series.
    pub raw_range_ratio: f64,
    /// `(max - min) / mean` of the series actually scored.
    pub price_range_ratio: f64,
    pub base_score: f64,
    pub new_listing_boost: f64,
    pub jitter: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub trend: TrendResult,
    pub stability: f64,
    pub details: Option<PriceDetails>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitivePosition {
    pub score: f64,
    pub factors: Vec<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    pub title: String,
    pub rank: Vec<TimeSeriesPoint>,
    pub price: Vec<TimeSeriesPoint>,
    pub sales: Vec<TimeSeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAnalysis {
    pub rank: RankAnalysis,
    pub price: PriceAnalysis,
    pub competitive_position: CompetitivePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingAnalysisResult {
    pub identifier: String,
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub series_data: SeriesData,
    pub analysis: ListingAnalysis,
}

impl ListingAnalysisResult {
    pub fn is_ok(&self) -> bool {
        self.status == AnalysisStatus::Ok
    }
}

/// Failures of the upstream history fetch. Fatal for the whole batch.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("provider rejected the request: {0}")]
    Api(String),
    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),
    #[error("failed to read history file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(e.to_string())
        }
    }
}

/// Batch-level engine failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("batch contains no valid listing identifiers")]
    NoValidIdentifiers,
    #[error("history fetch failed: {0}")]
    Transport(#[from] ProviderError),
}

/// Per-listing data problems. These degrade a single record to `error` status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundleError {
    #[error("no history returned for listing")]
    Missing,
    #[error("history for listing has no channel data")]
    NoChannels,
    #[error("history for listing could not be decoded: {0}")]
    Malformed(String),
}
