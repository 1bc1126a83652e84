//! Vertical search gateway client.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::{pointer, read_json};
use crate::error::DemoError;
use crate::search::SearchResponse;

/// Live vertical query endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str =
    "https://liveapi-us2.yext.com/v2/accounts/me/search/vertical/query";

/// Base of the configuration (CaC) and knowledge-graph APIs.
pub const DEFAULT_CONFIG_API_BASE: &str = "https://api.yext.com/v2/accounts/me";

/// Version date sent as the `v` parameter.
pub const DEFAULT_API_VERSION: &str = "20230601";

/// Experience version label sent as the `version` parameter.
pub const SEARCH_VERSION: &str = "PRODUCTION";

/// Result of a vertical search: the raw envelope plus its parsed `response`.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub raw: Value,
    pub response: SearchResponse,
    pub took_ms: u64,
}

/// Interface for issuing vertical search queries.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Run `query` against one vertical of an experience.
    ///
    /// `endpoint_override` replaces the configured endpoint for this call
    /// (used to compare two backends side by side).
    async fn search(
        &self,
        query: &str,
        experience_key: &str,
        vertical_key: &str,
        endpoint_override: Option<&str>,
    ) -> Result<SearchOutcome, DemoError>;

    /// Short label for logs.
    fn backend(&self) -> &str;
}

/// HTTP client for the hosted search platform.
#[derive(Clone)]
pub struct YextSearchClient {
    http: reqwest::Client,
    api_key: String,
    version: String,
    locale: String,
    endpoint: String,
    config_api_base: String,
}

impl std::fmt::Debug for YextSearchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YextSearchClient")
            .field("endpoint", &self.endpoint)
            .field("locale", &self.locale)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl YextSearchClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            version: DEFAULT_API_VERSION.to_string(),
            locale: "en".to_string(),
            endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            config_api_base: DEFAULT_CONFIG_API_BASE.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_config_api_base(mut self, base: impl Into<String>) -> Self {
        self.config_api_base = base.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    fn default_params(&self) -> [(&'static str, &str); 2] {
        [("api_key", self.api_key.as_str()), ("v", self.version.as_str())]
    }

    async fn config_get(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> Result<Value, DemoError> {
        let url = format!("{}/{}", self.config_api_base.trim_end_matches('/'), path);
        debug!(url = %url, "Config API request");
        let response = self
            .http
            .get(&url)
            .query(&self.default_params())
            .query(extra)
            .send()
            .await?;
        let body = read_json("config", response).await?;
        Ok(pointer(&body, "response")?.clone())
    }

    /// Entity type names defined in the account.
    pub async fn entity_types(&self) -> Result<Value, DemoError> {
        self.config_get("config/resourcenames/km/entity-type", &[]).await
    }

    /// Search experience keys defined in the account.
    pub async fn search_experiences(&self) -> Result<Value, DemoError> {
        self.config_get("config/resourcenames/answers/answers-config", &[])
            .await
    }

    /// Full configuration of one search experience.
    pub async fn search_experience(&self, experience_key: &str) -> Result<Value, DemoError> {
        self.config_get(
            &format!("config/resources/answers/answers-config/{experience_key}"),
            &[],
        )
        .await
    }

    /// Entities of the given type.
    pub async fn list_entities(&self, entity_type: &str) -> Result<Value, DemoError> {
        let response = self
            .config_get("entities", &[("entityTypes", entity_type)])
            .await?;
        Ok(pointer(&response, "entities")?.clone())
    }
}

#[async_trait]
impl SearchGateway for YextSearchClient {
    async fn search(
        &self,
        query: &str,
        experience_key: &str,
        vertical_key: &str,
        endpoint_override: Option<&str>,
    ) -> Result<SearchOutcome, DemoError> {
        let start = Instant::now();
        let endpoint = endpoint_override.unwrap_or(&self.endpoint);

        let params = [
            ("input", query),
            ("api_key", self.api_key.as_str()),
            ("locale", self.locale.as_str()),
            ("v", self.version.as_str()),
            ("experienceKey", experience_key),
            ("version", SEARCH_VERSION),
            ("verticalKey", vertical_key),
        ];

        let response = self.http.get(endpoint).query(&params).send().await?;
        let raw = read_json("search", response).await?;
        let parsed = SearchResponse::from_envelope(&raw)?;
        let took_ms = start.elapsed().as_millis() as u64;

        info!(
            experience_key,
            vertical_key,
            results = parsed.results.len(),
            direct_answer = parsed.direct_answer.is_some(),
            took_ms,
            "Vertical search completed"
        );

        Ok(SearchOutcome {
            raw,
            response: parsed,
            took_ms,
        })
    }

    fn backend(&self) -> &str {
        "yext"
    }
}
