//! Translation backend client.

use async_trait::async_trait;
use tracing::debug;

use super::{pointer_str, read_json};
use crate::error::DemoError;

pub const DEFAULT_TRANSLATE_ENDPOINT: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// Translates plain text between locales.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, DemoError>;
}

#[derive(Clone)]
pub struct GoogleTranslateClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleTranslateClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Translator for GoogleTranslateClient {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, DemoError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        debug!(source_locale, target_locale, chars = text.len(), "Translating text");

        let params = [
            ("key", self.api_key.as_str()),
            ("q", text),
            ("format", "text"),
            ("source", source_locale),
            ("target", target_locale),
        ];
        let response = self.http.post(&self.endpoint).query(&params).send().await?;
        let body = read_json("translation", response).await?;

        pointer_str(&body, "data.translations.0.translatedText")
    }
}
