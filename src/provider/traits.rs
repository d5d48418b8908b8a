use crate::model::{ProviderError, RawChannelBundle};
use std::collections::HashMap;

/// Source of raw rank/price history. Queried once per batch.
#[async_trait::async_trait]
pub trait HistoryProvider: Send + Sync {
    /// Returns bundles keyed by upper-cased identifier. Identifiers the
    /// provider knows nothing about are simply absent from the map.
    async fn fetch_history(
        &self,
        identifiers: &[String],
        history_days: u32,
    ) -> Result<HashMap<String, RawChannelBundle>, ProviderError>;
}
