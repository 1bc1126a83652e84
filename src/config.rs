//! Configuration module for the demo service.
//!
//! Service settings come from environment variables with sensible defaults.
//! Tenants (the searchable demos shown in the selector) are either the two
//! built-in demos or a JSON file named by `DEMOS_FILE`.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clients::Endpoints;
use crate::search::NormalizerConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Demo UI HTTP port
    pub http_port: u16,
    /// Prometheus metrics HTTP port
    pub metrics_port: u16,
    /// Bind address (supports IPv4, IPv6, or dual-stack)
    pub bind_address: String,
    /// Serve fixture data instead of calling upstream APIs (opt-in via MOCK_UPSTREAM)
    pub mock_upstream: bool,
    /// Timeout applied to every upstream request
    pub http_timeout: Duration,
    /// Upstream base URLs
    pub endpoints: Endpoints,
    /// Searchable tenants, in selector order
    pub demos: Vec<DemoConfig>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// One searchable tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub api_key: String,
    pub experience_key: String,
    pub vertical_key: String,
    #[serde(default)]
    pub default_search: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Alternate search endpoint for this tenant (A/B comparison)
    #[serde(default)]
    pub search_endpoint: Option<String>,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub chat: Option<ChatConfig>,
    #[serde(default)]
    pub translation: Option<TranslationConfig>,
}

/// Conversational agent settings for generated answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default)]
    pub api_key: String,
    pub bot_id: String,
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default)]
    pub step_indices: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_locale")]
    pub source_locale: String,
    #[serde(default = "default_target_locale")]
    pub target_locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_target_locale() -> String {
    "ja".to_string()
}

fn default_goal() -> String {
    "ANSWER_QUESTION".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `HTTP_PORT` - Demo UI port (default: 8501)
    /// - `METRICS_PORT` - Prometheus metrics port (default: 9090)
    /// - `BIND_ADDRESS` - Bind address (default: auto-detect [::] or 0.0.0.0)
    /// - `MOCK_UPSTREAM` - Use fixture clients (default: false)
    /// - `HTTP_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    /// - `DEMOS_FILE` - JSON array of tenant records (default: built-in demos)
    /// - `BOOK_SEARCH_API_KEY`, `SAMSUNG_SEARCH_API_KEY` - keys for the built-in demos
    /// - `CHAT_API_KEY`, `CHAT_BOT_ID` - enable generated answers for built-in demos
    /// - `TRANSLATE_API_KEY` - enable translation for built-in demos
    /// - `SEARCH_ENDPOINT`, `CHAT_ENDPOINT`, `TRANSLATE_ENDPOINT` - upstream overrides
    /// - `RUST_LOG` - Log level (default: info)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mock_upstream = env::var("MOCK_UPSTREAM")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        let http_port = parse_var("HTTP_PORT").unwrap_or(8501);
        let metrics_port = parse_var("METRICS_PORT").unwrap_or(9090);
        let http_timeout = Duration::from_secs(parse_var("HTTP_TIMEOUT_SECS").unwrap_or(30));

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "auto".to_string());

        let defaults = Endpoints::default();
        let endpoints = Endpoints {
            search: env::var("SEARCH_ENDPOINT").unwrap_or(defaults.search),
            chat: env::var("CHAT_ENDPOINT").unwrap_or(defaults.chat),
            translation: env::var("TRANSLATE_ENDPOINT").unwrap_or(defaults.translation),
        };

        let demos = match env::var("DEMOS_FILE") {
            Ok(path) if !path.is_empty() => load_demos_file(&path)?,
            _ => builtin_demos(),
        };
        validate_demos(&demos, mock_upstream)?;

        Ok(Config {
            http_port,
            metrics_port,
            bind_address,
            mock_upstream,
            http_timeout,
            endpoints,
            demos,
            log_level,
        })
    }

    /// Look up a tenant by id.
    pub fn demo(&self, id: &str) -> Option<&DemoConfig> {
        self.demos.iter().find(|demo| demo.id == id)
    }
}

/// `host:port` for an explicit bind address, bracketing bare IPv6 hosts.
pub fn format_bind_address(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

fn var_or_empty(key: &str) -> String {
    env::var(key).unwrap_or_default()
}

/// Parse a JSON array of tenant records.
pub fn parse_demos(json: &str) -> Result<Vec<DemoConfig>, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::InvalidDemos(e.to_string()))
}

fn load_demos_file(path: &str) -> Result<Vec<DemoConfig>, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::InvalidDemos(format!("{path}: {e}")))?;
    parse_demos(&contents)
}

/// The two demos shipped with the service, keyed from the environment.
pub fn builtin_demos() -> Vec<DemoConfig> {
    let chat = match (env::var("CHAT_API_KEY"), env::var("CHAT_BOT_ID")) {
        (Ok(api_key), Ok(bot_id)) => Some(ChatConfig {
            api_key,
            bot_id,
            goal: default_goal(),
            step_indices: vec![0],
        }),
        _ => None,
    };
    let translation = env::var("TRANSLATE_API_KEY").ok().map(|api_key| TranslationConfig {
        api_key,
        source_locale: default_locale(),
        target_locale: default_target_locale(),
    });

    vec![
        DemoConfig {
            id: "harry_potter".to_string(),
            name: "Harry Potter Books".to_string(),
            api_key: var_or_empty("BOOK_SEARCH_API_KEY"),
            experience_key: "book-search".to_string(),
            vertical_key: "books".to_string(),
            default_search: "Who is Albus Dumbledore?".to_string(),
            locale: default_locale(),
            search_endpoint: None,
            normalizer: NormalizerConfig::default(),
            chat: chat.clone(),
            translation: translation.clone(),
        },
        DemoConfig {
            id: "samsung".to_string(),
            name: "Samsung Troubleshooting Guides".to_string(),
            api_key: var_or_empty("SAMSUNG_SEARCH_API_KEY"),
            experience_key: "samsung-troubleshooting-search".to_string(),
            vertical_key: "guides".to_string(),
            default_search: "How do I reset my ice maker?".to_string(),
            locale: default_locale(),
            search_endpoint: None,
            normalizer: NormalizerConfig::default(),
            chat,
            translation,
        },
    ]
}

fn validate_demos(demos: &[DemoConfig], mock_upstream: bool) -> Result<(), ConfigError> {
    if demos.is_empty() {
        return Err(ConfigError::InvalidDemos("no demos configured".into()));
    }
    for (idx, demo) in demos.iter().enumerate() {
        if demos[..idx].iter().any(|other| other.id == demo.id) {
            return Err(ConfigError::InvalidDemos(format!("duplicate demo id `{}`", demo.id)));
        }
        if !mock_upstream && demo.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey(demo.id.clone()));
        }
    }
    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing API key for demo `{0}` (set MOCK_UPSTREAM=true to run with fixtures)")]
    MissingApiKey(String),

    #[error("Invalid demo configuration: {0}")]
    InvalidDemos(String),
}
