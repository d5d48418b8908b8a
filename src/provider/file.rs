use crate::model::{ProviderError, RawChannelBundle};
use crate::provider::envelope::parse_envelope;
use crate::provider::traits::HistoryProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Reads a saved API response from disk. Useful for offline runs.
pub struct FileHistoryProvider {
    path: PathBuf,
}

impl FileHistoryProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl HistoryProvider for FileHistoryProvider {
    async fn fetch_history(
        &self,
        identifiers: &[String],
        _history_days: u32,
    ) -> Result<HashMap<String, RawChannelBundle>, ProviderError> {
        debug!("Loading history for {} listings from {}", identifiers.len(), self.path.display());
        let body = tokio::fs::read_to_string(&self.path).await?;
        let mut bundles = parse_envelope(&body)?;
        bundles.retain(|id, _| identifiers.iter().any(|wanted| wanted == id));
        Ok(bundles)
    }
}
