pub mod envelope;
pub mod fetcher;
pub mod file;
pub mod traits;

pub use envelope::parse_envelope;
pub use fetcher::HttpHistoryProvider;
pub use file::FileHistoryProvider;
pub use traits::HistoryProvider;

use crate::config::ProviderConfig;
use crate::model::ProviderError;
use std::time::Duration;

/// Builds the provider selected in the config.
pub fn from_config(cfg: &ProviderConfig) -> Result<Box<dyn HistoryProvider>, ProviderError> {
    match cfg {
        ProviderConfig::Http {
            base_url,
            api_key,
            domain,
            timeout_seconds,
        } => Ok(Box::new(HttpHistoryProvider::new(
            base_url.clone(),
            api_key.clone(),
            *domain,
            Duration::from_secs(*timeout_seconds),
        )?)),
        ProviderConfig::File { path } => Ok(Box::new(FileHistoryProvider::new(path.clone()))),
    }
}
