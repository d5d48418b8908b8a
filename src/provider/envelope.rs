// Response envelope of the history API
use crate::model::{ProviderError, RawChannelBundle};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    products: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses a provider response body into bundles keyed by upper-cased identifier.
///
/// Only a broken envelope is an error. A product whose history does not decode
/// comes back as an [`RawChannelBundle::undecodable`] bundle so that just that
/// listing degrades; a product without an identifier is dropped.
pub fn parse_envelope(body: &str) -> Result<HashMap<String, RawChannelBundle>, ProviderError> {
    let envelope: HistoryEnvelope =
        serde_json::from_str(body).map_err(|e| ProviderError::MalformedEnvelope(e.to_string()))?;

    if let Some(err) = envelope.error {
        let message = err
            .message
            .or(err.kind)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(ProviderError::Api(message));
    }

    let products = envelope
        .products
        .ok_or_else(|| ProviderError::MalformedEnvelope("missing products".to_string()))?;

    Ok(products.into_iter().filter_map(decode_product).collect())
}

fn decode_product(product: Value) -> Option<(String, RawChannelBundle)> {
    let identifier = match product.get("asin").and_then(Value::as_str).map(str::trim) {
        Some(id) if !id.is_empty() => id.to_uppercase(),
        _ => {
            warn!("Dropping product without an identifier");
            return None;
        }
    };
    let title = product.get("title").and_then(Value::as_str).map(str::to_string);

    let bundle = match serde_json::from_value::<RawChannelBundle>(product) {
        Ok(bundle) => bundle,
        Err(e) => {
            warn!("History for {} failed to decode: {}", identifier, e);
            RawChannelBundle::undecodable(identifier.clone(), title, e.to_string())
        }
    };
    Some((identifier, bundle))
}
