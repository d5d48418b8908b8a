use crate::model::{ProviderError, RawChannelBundle};
use crate::provider::envelope::parse_envelope;
use crate::provider::traits::HistoryProvider;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// History provider backed by the remote product API.
pub struct HttpHistoryProvider {
    client: Client,
    base_url: String,
    api_key: String,
    domain: u32,
}

impl HttpHistoryProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        domain: u32,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent("listing-signals/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            domain,
        })
    }

    fn build_url(&self) -> String {
        format!("{}/product", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl HistoryProvider for HttpHistoryProvider {
    async fn fetch_history(
        &self,
        identifiers: &[String],
        history_days: u32,
    ) -> Result<HashMap<String, RawChannelBundle>, ProviderError> {
        let url = self.build_url();
        debug!("Requesting history for {} listings from {}", identifiers.len(), url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.clone()),
                ("domain", self.domain.to_string()),
                ("asin", identifiers.join(",")),
                ("days", history_days.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("History API returned {}", status);
            return Err(ProviderError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        parse_envelope(&body)
    }
}
