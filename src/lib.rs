//! Competitive-signal analysis for marketplace listings.
//!
//! Raw rank and price history (flat `offset, value` channel encodings) is
//! decoded into time series and scored for rank stability, price stability,
//! trend and competitive position. Each listing is analyzed independently;
//! a listing with unusable data degrades to an `error` record instead of
//! failing its batch.

pub mod analyzer;
pub mod config;
pub mod engine;
pub mod model;
pub mod normalizer;
pub mod provider;
pub mod utils;

pub use config::{AnalysisConfig, AppConfig, load_config};
pub use engine::{AnalysisEngine, BatchSummary, validate_identifiers};
pub use model::{
    AnalysisStatus, BundleError, EngineError, ListingAnalysisResult, ProviderError,
    RawChannelBundle, TimeSeriesPoint, TrendDirection,
};
pub use provider::{FileHistoryProvider, HistoryProvider, HttpHistoryProvider};
