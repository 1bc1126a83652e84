//! Process-lifetime cache of upstream clients keyed by credentials.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use super::chat::{AnswerGenerator, ChatClient, DEFAULT_CHAT_BASE};
use super::gateway::{SearchGateway, YextSearchClient, DEFAULT_SEARCH_ENDPOINT};
use super::mock::{MockAnswerGenerator, MockSearchGateway, MockTranslator};
use super::translate::{GoogleTranslateClient, Translator, DEFAULT_TRANSLATE_ENDPOINT};

/// Upstream base URLs used when constructing clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub search: String,
    pub chat: String,
    pub translation: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: DEFAULT_SEARCH_ENDPOINT.to_string(),
            chat: DEFAULT_CHAT_BASE.to_string(),
            translation: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
        }
    }
}

type Cache<T> = RwLock<HashMap<String, Arc<T>>>;

/// Hands out one client per credential key, built on first use.
///
/// Clients hold nothing but credentials and the shared HTTP pool, so entries
/// are never evicted. In mock mode every lookup returns a fixture client.
pub struct ClientRegistry {
    http: reqwest::Client,
    endpoints: Endpoints,
    mock: bool,
    gateways: Cache<dyn SearchGateway>,
    generators: Cache<dyn AnswerGenerator>,
    translators: Cache<dyn Translator>,
}

impl ClientRegistry {
    pub fn new(http: reqwest::Client, endpoints: Endpoints, mock: bool) -> Self {
        Self {
            http,
            endpoints,
            mock,
            gateways: RwLock::new(HashMap::new()),
            generators: RwLock::new(HashMap::new()),
            translators: RwLock::new(HashMap::new()),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.mock
    }

    async fn get_or_insert<T: ?Sized>(
        cache: &Cache<T>,
        key: &str,
        build: impl FnOnce() -> Arc<T>,
    ) -> Arc<T> {
        if let Some(client) = cache.read().await.get(key) {
            return Arc::clone(client);
        }

        let mut guard = cache.write().await;
        // Another request may have built it while we waited for the write lock.
        Arc::clone(guard.entry(key.to_string()).or_insert_with(build))
    }

    /// Search gateway for the given API key and locale.
    pub async fn search_gateway(&self, api_key: &str, locale: &str) -> Arc<dyn SearchGateway> {
        let key = format!("{locale}:{api_key}");
        Self::get_or_insert(&self.gateways, &key, || {
            info!(mock = self.mock, locale, "Creating search gateway client");
            let client: Arc<dyn SearchGateway> = if self.mock {
                Arc::new(MockSearchGateway::new())
            } else {
                Arc::new(
                    YextSearchClient::new(self.http.clone(), api_key)
                        .with_endpoint(&self.endpoints.search)
                        .with_locale(locale),
                )
            };
            client
        })
        .await
    }

    /// Chat answer generator for the given API key.
    pub async fn answer_generator(&self, api_key: &str) -> Arc<dyn AnswerGenerator> {
        Self::get_or_insert(&self.generators, api_key, || {
            info!(mock = self.mock, "Creating chat client");
            let client: Arc<dyn AnswerGenerator> = if self.mock {
                Arc::new(MockAnswerGenerator)
            } else {
                Arc::new(
                    ChatClient::new(self.http.clone(), api_key).with_base_url(&self.endpoints.chat),
                )
            };
            client
        })
        .await
    }

    /// Translator for the given API key.
    pub async fn translator(&self, api_key: &str) -> Arc<dyn Translator> {
        Self::get_or_insert(&self.translators, api_key, || {
            info!(mock = self.mock, "Creating translation client");
            let client: Arc<dyn Translator> = if self.mock {
                Arc::new(MockTranslator)
            } else {
                Arc::new(
                    GoogleTranslateClient::new(self.http.clone(), api_key)
                        .with_endpoint(&self.endpoints.translation),
                )
            };
            client
        })
        .await
    }
}
