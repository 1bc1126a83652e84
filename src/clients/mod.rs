//! Thin HTTP clients for the hosted search, chat and translation backends.
//!
//! Each backend sits behind a trait so the demo can run against fixtures:
//! - `SearchGateway` - `YextSearchClient` / `MockSearchGateway`
//! - `AnswerGenerator` - `ChatClient` / `MockAnswerGenerator`
//! - `Translator` - `GoogleTranslateClient` / `MockTranslator`
//!
//! `ClientRegistry` caches one client per credential set for the process lifetime.

mod chat;
mod gateway;
mod mock;
mod registry;
mod translate;

use std::time::Duration;

use serde_json::Value;
use tracing::error;

use crate::error::DemoError;

pub use chat::{AnswerGenerator, ChatClient, ChatMessage, CompletionClient, ConverseRequest};
pub use gateway::{SearchGateway, SearchOutcome, YextSearchClient};
pub use mock::{MockAnswerGenerator, MockSearchGateway, MockTranslator};
pub use registry::{ClientRegistry, Endpoints};
pub use translate::{GoogleTranslateClient, Translator};

/// Build the HTTP client shared by every upstream client.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, DemoError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(DemoError::Transport)
}

/// Check the status of an upstream response and decode its JSON body.
///
/// Non-success statuses become `DemoError::Upstream` carrying the raw body.
pub(crate) async fn read_json(
    service: &'static str,
    response: reqwest::Response,
) -> Result<Value, DemoError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(
            service,
            status = status.as_u16(),
            body = %body,
            "Upstream request failed"
        );
        return Err(DemoError::Upstream {
            service,
            status: status.as_u16(),
            body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| DemoError::MalformedResponse(format!("{service} returned invalid JSON: {e}")))
}

/// Follow a path of object keys / array indices through a JSON value.
pub(crate) fn pointer<'a>(value: &'a Value, path: &str) -> Result<&'a Value, DemoError> {
    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) => current.get(idx),
            Err(_) => current.get(part),
        }
        .ok_or_else(|| DemoError::missing(path))?;
    }
    Ok(current)
}

/// Like `pointer`, but the leaf must be a string.
pub(crate) fn pointer_str(value: &Value, path: &str) -> Result<String, DemoError> {
    pointer(value, path)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DemoError::missing(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pointer_walks_objects_and_arrays() {
        let value = json!({"data": {"translations": [{"translatedText": "こんにちは"}]}});
        assert_eq!(
            pointer_str(&value, "data.translations.0.translatedText").unwrap(),
            "こんにちは"
        );
    }

    #[test]
    fn test_pointer_reports_full_path_on_miss() {
        let value = json!({"data": {"translations": []}});
        let err = pointer(&value, "data.translations.0.translatedText").unwrap_err();
        assert!(err.to_string().contains("data.translations.0.translatedText"));
    }

    #[test]
    fn test_pointer_str_rejects_non_string_leaf() {
        let value = json!({"response": {"message": {"text": 5}}});
        assert!(pointer_str(&value, "response.message.text").is_err());
    }
}
