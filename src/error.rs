//! Error types for the demo service.

use axum::http::StatusCode;

/// Errors raised while serving a single demo interaction.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("Request to {service} failed with status code {status}: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unknown demo: {0}")]
    UnknownDemo(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DemoError {
    /// Shorthand for a missing or mistyped JSON path.
    pub fn missing(path: &str) -> Self {
        DemoError::MalformedResponse(format!("missing field `{path}`"))
    }

    /// HTTP status surfaced to the browser for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DemoError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            DemoError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            DemoError::Transport(_) => StatusCode::BAD_GATEWAY,
            DemoError::UnknownDemo(_) => StatusCode::NOT_FOUND,
            DemoError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}
