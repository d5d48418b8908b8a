use crate::analyzer::{analyze_price, analyze_rank, competitive_position, default_price_analysis};
use crate::config::{AnalysisConfig, ChannelConfig};
use crate::model::{
    AnalysisStatus, BundleError, EngineError, ListingAnalysis,
    ListingAnalysisResult, RankAnalysis, RawChannelBundle, SeriesData, TimeSeriesPoint,
};
use crate::normalizer::{decode_series, scale_values};
use crate::provider::HistoryProvider;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

pub const IDENTIFIER_LEN: usize = 10;

/// Trims, upper-cases and de-duplicates identifiers, dropping anything that is
/// not a 10-character alphanumeric code.
pub fn validate_identifiers(identifiers: &[String]) -> Result<Vec<String>, EngineError> {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();
    for raw in identifiers {
        let id = raw.trim().to_uppercase();
        if id.len() != IDENTIFIER_LEN || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            warn!("Skipping invalid listing identifier: {:?}", raw);
            continue;
        }
        if seen.insert(id.clone()) {
            valid.push(id);
        }
    }

    if valid.is_empty() {
        return Err(EngineError::NoValidIdentifiers);
    }
    Ok(valid)
}

/// Uses the first candidate when it yields at least `min_points`, otherwise
/// whichever candidate yields the most points. Earlier candidates win ties.
pub fn select_channel(
    bundle: &RawChannelBundle,
    candidates: &[usize],
    min_points: usize,
) -> (Option<usize>, Vec<TimeSeriesPoint>) {
    let mut best: (Option<usize>, Vec<TimeSeriesPoint>) = (None, Vec::new());
    for (position, &channel) in candidates.iter().enumerate() {
        let points = decode_series(bundle.channel(channel));
        if position == 0 && points.len() >= min_points {
            return (Some(channel), points);
        }
        if best.0.is_none() || points.len() > best.1.len() {
            best = (Some(channel), points);
        }
    }
    best
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[ListingAnalysisResult]) -> Self {
        let ok = results.iter().filter(|r| r.is_ok()).count();
        Self {
            total: results.len(),
            ok,
            errors: results.len() - ok,
        }
    }
}

/// Turns raw channel bundles into per-listing analysis records.
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Validates the identifiers, fetches their history in a single provider
    /// call and analyzes every listing.
    pub async fn analyze_batch<P: HistoryProvider + ?Sized>(
        &self,
        provider: &P,
        identifiers: &[String],
        history_days: u32,
    ) -> Result<Vec<ListingAnalysisResult>, EngineError> {
        let identifiers = validate_identifiers(identifiers)?;
        info!("Fetching history for {} listings ({} days)", identifiers.len(), history_days);
        let bundles = provider.fetch_history(&identifiers, history_days).await?;
        debug!("Provider returned {} bundles", bundles.len());

        let results = self.analyze_bundles(&identifiers, &bundles);
        let summary = BatchSummary::from_results(&results);
        info!(
            "Batch analyzed: {} listings, {} ok, {} degraded",
            summary.total, summary.ok, summary.errors
        );
        Ok(results)
    }

    /// Analyzes an already fetched batch. Each listing gets its own random
    /// source, derived from `jitter_seed` and the listing's position when set.
    pub fn analyze_bundles(
        &self,
        identifiers: &[String],
        bundles: &HashMap<String, RawChannelBundle>,
    ) -> Vec<ListingAnalysisResult> {
        identifiers
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let mut rng = match self.config.jitter_seed {
                    Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
                    None => StdRng::from_os_rng(),
                };
                self.analyze_listing(id, bundles.get(id), &mut rng)
            })
            .collect()
    }

    /// Analyzes one listing. Missing or unusable bundles produce an `error`
    /// record with every analysis field at its default.
    pub fn analyze_listing<R: Rng>(
        &self,
        identifier: &str,
        bundle: Option<&RawChannelBundle>,
        rng: &mut R,
    ) -> ListingAnalysisResult {
        let bundle = match check_bundle(bundle) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!("Listing {} degraded: {}", identifier, e);
                return self.error_result(identifier, bundle, e);
            }
        };

        let channels = &self.config.channels;
        let rank = decode_series(bundle.channel(channels.rank));
        let sales = decode_series(bundle.channel(channels.sales));
        let price = self.select_price(identifier, bundle, channels);

        let mut rank_analysis = analyze_rank(&rank, &self.config);
        let mut price_analysis = analyze_price(&price, &self.config, rng);
        let competitive = competitive_position(&rank, &self.config.competitive);

        if !self.config.include_details {
            rank_analysis.details = None;
            price_analysis.details = None;
        }

        debug!(
            "Listing {}: rank stability {:.3}, price stability {:.3}, score {:.2}",
            identifier, rank_analysis.stability, price_analysis.stability, competitive.score
        );

        ListingAnalysisResult {
            identifier: identifier.to_string(),
            status: AnalysisStatus::Ok,
            error: None,
            series_data: SeriesData {
                title: bundle.title.clone().unwrap_or_default(),
                rank,
                price,
                sales,
            },
            analysis: ListingAnalysis {
                rank: rank_analysis,
                price: price_analysis,
                competitive_position: competitive,
            },
        }
    }

    fn select_price(
        &self,
        identifier: &str,
        bundle: &RawChannelBundle,
        channels: &ChannelConfig,
    ) -> Vec<TimeSeriesPoint> {
        let candidates = channels.price_candidates();
        let (chosen, points) = select_channel(bundle, &candidates, self.config.price.min_points);
        if chosen.is_some_and(|c| c != channels.price_primary) {
            debug!("Listing {}: using fallback price channel {:?}", identifier, chosen);
        }
        scale_values(&points, self.config.price.minor_unit_divisor)
    }

    fn error_result(
        &self,
        identifier: &str,
        bundle: Option<&RawChannelBundle>,
        error: BundleError,
    ) -> ListingAnalysisResult {
        ListingAnalysisResult {
            identifier: identifier.to_string(),
            status: AnalysisStatus::Error,
            error: Some(error.to_string()),
            series_data: SeriesData {
                title: bundle.and_then(|b| b.title.clone()).unwrap_or_default(),
                ..SeriesData::default()
            },
            analysis: ListingAnalysis {
                rank: RankAnalysis::default(),
                price: default_price_analysis(&self.config.price),
                competitive_position: competitive_position(&[], &self.config.competitive),
            },
        }
    }
}

fn check_bundle(bundle: Option<&RawChannelBundle>) -> Result<&RawChannelBundle, BundleError> {
    let bundle = bundle.ok_or(BundleError::Missing)?;
    if let Some(reason) = &bundle.decode_error {
        return Err(BundleError::Malformed(reason.clone()));
    }
    if bundle.channels.is_empty() {
        return Err(BundleError::NoChannels);
    }
    Ok(bundle)
}
