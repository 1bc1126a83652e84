//! Chat backends: the conversational bot endpoint and the chat-completion
//! model gateway.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{pointer_str, read_json};
use crate::error::DemoError;
use crate::search::SearchResponse;

/// Base URL of the chat bot endpoint; the bot id and `/message` are appended.
pub const DEFAULT_CHAT_BASE: &str = "https://liveapi.yext.com/v2/accounts/me/chat";

/// Model gateway endpoint for chat completions.
pub const DEFAULT_COMPLETION_ENDPOINT: &str =
    "https://liveapi.yext.com/v2/accounts/me/dsg2/invokeModel";

pub const DEFAULT_CHAT_VERSION: &str = "20230601";
pub const DEFAULT_COMPLETION_VERSION: &str = "20231012";

/// Opening bot utterance sent ahead of the user query.
pub const DEFAULT_GREETING: &str = "Hi! How can I help you today?";

/// One conversational turn with its search context.
#[derive(Debug, Clone)]
pub struct ConverseRequest<'a> {
    pub query: &'a str,
    pub search_context: &'a SearchResponse,
    pub bot_id: &'a str,
    pub goal: &'a str,
    pub step_indices: &'a [u32],
}

/// Produces a generated answer for a query and its search results.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<String, DemoError>;
}

/// HTTP client for the conversational bot endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    api_key: String,
    version: String,
    base_url: String,
    greeting: String,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            version: DEFAULT_CHAT_VERSION.to_string(),
            base_url: DEFAULT_CHAT_BASE.to_string(),
            greeting: DEFAULT_GREETING.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    fn request_body(&self, request: &ConverseRequest<'_>) -> Value {
        json!({
            "messages": [
                {"source": "BOT", "text": self.greeting},
                {"source": "USER", "text": request.query},
            ],
            "notes": {
                "currentGoal": request.goal,
                "searchResults": request.search_context.results,
                "currentStepIndices": request.step_indices,
            }
        })
    }
}

#[async_trait]
impl AnswerGenerator for ChatClient {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<String, DemoError> {
        let url = format!(
            "{}/{}/message",
            self.base_url.trim_end_matches('/'),
            request.bot_id
        );
        debug!(bot_id = request.bot_id, goal = request.goal, "Sending chat turn");

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", self.api_key.as_str()), ("v", self.version.as_str())])
            .json(&self.request_body(&request))
            .send()
            .await?;
        let body = read_json("chat", response).await?;
        let text = pointer_str(&body, "response.message.text")?;

        info!(bot_id = request.bot_id, chars = text.len(), "Chat turn completed");
        Ok(text)
    }
}

/// A message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Client for the hosted model gateway's chat-completion endpoint.
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: String,
    version: String,
    endpoint: String,
}

impl CompletionClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            version: DEFAULT_COMPLETION_VERSION.to_string(),
            endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Run a chat completion and return the first choice's content.
    ///
    /// The gateway wraps the model's JSON response in
    /// `response.jsonResponse`.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, DemoError> {
        let body = json!({
            "locale": "en",
            "modelId": "openAiCompletions",
            "endpointId": "chatCompletions",
            "version": {"applicationVersion": "5"},
            "latencySensitive": false,
            "jsonRequest": {
                "model": model,
                "messages": messages,
                "max_tokens": max_tokens,
                "temperature": temperature,
            },
            "skipCache": false,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("api_key", self.api_key.as_str()), ("v", self.version.as_str())])
            .json(&body)
            .send()
            .await?;
        let body = read_json("completion", response).await?;

        pointer_str(&body, "response.jsonResponse.choices.0.message.content")
    }
}
