//! JSON bodies exchanged with prediction-style APIs.

use crate::gateway::ports::{PredictionStatus, ProviderError, ProviderPrediction, ProviderResult};
use crate::generation::domain::{AssetUrl, ProviderHandle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub(super) struct CreatePrediction<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'a str>,
    pub input: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_events_filter: Option<[&'static str; 1]>,
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Decodes a prediction body, as returned by status checks and sent to
/// webhooks.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidResponse`] when the body is not a
/// prediction or carries an unusable handle or output URL.
pub fn decode_prediction(body: &[u8]) -> ProviderResult<ProviderPrediction> {
    let parsed: PredictionBody = serde_json::from_slice(body)
        .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
    let handle = ProviderHandle::new(parsed.id)
        .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
    let outputs = parsed
        .output
        .map(output_urls)
        .transpose()?
        .unwrap_or_default();
    let error = parsed.error.and_then(|value| match value {
        Value::Null => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    });
    Ok(ProviderPrediction {
        handle,
        status: parsed.status,
        outputs,
        error,
    })
}

fn output_urls(output: Value) -> ProviderResult<Vec<AssetUrl>> {
    let raw: Vec<String> = match output {
        Value::Null => Vec::new(),
        Value::String(url) => vec![url],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(url) => Some(url),
                _ => None,
            })
            .collect(),
        other => {
            return Err(ProviderError::InvalidResponse(format!(
                "unsupported prediction output: {other}"
            )));
        }
    };
    raw.into_iter()
        .map(|url| {
            AssetUrl::new(url).map_err(|err| ProviderError::InvalidResponse(err.to_string()))
        })
        .collect()
}

/// Extracts a readable message from an error response body.
pub(super) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.detail.or(parsed.title))
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_owned())
}
