//! Demo HTTP surface: one search interaction per request.
//!
//! An interaction runs search, then the optional chat and translation steps,
//! then renders. Any failure aborts the interaction and the page shows an
//! error card instead of partial results.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, instrument};

use crate::clients::{ClientRegistry, ConverseRequest, SearchOutcome};
use crate::config::{Config, DemoConfig};
use crate::error::DemoError;
use crate::metrics;
use crate::render::{render_page, Card, DemoOption, PageView};
use crate::search::{boost, normalize_direct_answer, normalize_result};

const PAGE_TITLE: &str = "Demo: Vector Document Search";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ClientRegistry>,
}

impl AppState {
    pub fn new(config: Config, registry: ClientRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    fn demo(&self, id: &str) -> Result<&DemoConfig, DemoError> {
        self.config
            .demo(id)
            .ok_or_else(|| DemoError::UnknownDemo(id.to_string()))
    }

    fn default_demo_id(&self) -> String {
        self.config
            .demos
            .first()
            .map(|demo| demo.id.clone())
            .unwrap_or_default()
    }
}

/// Query string of the search page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub demo: Option<String>,
    /// Absent means "use the demo's default search"; empty means "no search".
    pub q: Option<String>,
    #[serde(default)]
    pub generate: bool,
    #[serde(default)]
    pub translate: bool,
}

/// Cards and raw upstream payload produced by one interaction.
#[derive(Debug, Default)]
pub struct Interaction {
    pub cards: Vec<Card>,
    pub raw_response: Option<Value>,
}

#[derive(Debug, Serialize)]
struct DemoSummary<'a> {
    id: &'a str,
    name: &'a str,
    default_search: &'a str,
    chat: bool,
    translation: bool,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/search", get(api_search))
        .route("/api/demos", get(api_demos))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(index))
        .route("/search", get(search_page))
        .route("/health", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn record_failure(err: &DemoError) {
    match err {
        DemoError::Upstream { service, .. } => metrics::increment_upstream_errors(*service),
        DemoError::Transport(_) => metrics::increment_upstream_errors("transport"),
        DemoError::MalformedResponse(_) => metrics::increment_upstream_errors("malformed"),
        _ => {}
    }
}

/// Run search → optional chat → optional translation for one query.
#[instrument(skip(state, demo), fields(demo = %demo.id))]
pub async fn run_interaction(
    state: &AppState,
    demo: &DemoConfig,
    query: &str,
    generate: bool,
    translate: bool,
) -> Result<Interaction, DemoError> {
    if query.trim().is_empty() {
        return Ok(Interaction::default());
    }

    let gateway = state.registry.search_gateway(&demo.api_key, &demo.locale).await;
    let outcome = gateway
        .search(
            query,
            &demo.experience_key,
            &demo.vertical_key,
            demo.search_endpoint.as_deref(),
        )
        .await?;

    metrics::increment_search_count(&demo.id);
    metrics::record_search_latency(outcome.took_ms as f64);

    let mut cards = Vec::new();
    let mut results = outcome.response.results.clone();

    match (&demo.chat, generate) {
        (Some(chat), true) => {
            let generator = state.registry.answer_generator(&chat.api_key).await;
            let text = generator
                .converse(ConverseRequest {
                    query,
                    search_context: &outcome.response,
                    bot_id: &chat.bot_id,
                    goal: &chat.goal,
                    step_indices: &chat.step_indices,
                })
                .await?;
            cards.push(Card::GeneratedAnswer(text));
        }
        _ => {
            if let Some(raw) = &outcome.response.direct_answer {
                let answer = normalize_direct_answer(raw)?;
                let boosted = if demo.normalizer.boost_direct_answer {
                    let (boosted, remaining) = boost(&answer, results);
                    results = remaining;
                    boosted
                } else {
                    None
                };
                cards.push(Card::DirectAnswer(answer));
                if let Some(boosted) = boosted {
                    cards.push(Card::Result(normalize_result(&boosted, &demo.normalizer)));
                }
            }
        }
    }

    cards.extend(
        results
            .iter()
            .map(|result| Card::Result(normalize_result(result, &demo.normalizer))),
    );

    if let (Some(translation), true) = (&demo.translation, translate) {
        let translator = state.registry.translator(&translation.api_key).await;
        let (source, target) = (
            translation.source_locale.as_str(),
            translation.target_locale.as_str(),
        );
        for card in &mut cards {
            match card {
                Card::DirectAnswer(answer) => {
                    answer.display_answer = translator
                        .translate(&answer.display_answer, source, target)
                        .await?;
                }
                Card::GeneratedAnswer(text) => {
                    *text = translator.translate(text, source, target).await?;
                }
                Card::Result(result) => {
                    result.display_segment = translator
                        .translate(&result.display_segment, source, target)
                        .await?;
                }
            }
        }
    }

    info!(cards = cards.len(), "Interaction completed");

    Ok(Interaction {
        cards,
        raw_response: Some(outcome.raw),
    })
}

fn page_view(
    state: &AppState,
    demo_id: &str,
    query: &str,
    generate: bool,
    translate: bool,
) -> PageView {
    let demo = state.config.demo(demo_id);
    PageView {
        title: PAGE_TITLE.to_string(),
        demos: state
            .config
            .demos
            .iter()
            .map(|demo| DemoOption {
                id: demo.id.clone(),
                name: demo.name.clone(),
            })
            .collect(),
        selected_demo: demo_id.to_string(),
        query: query.to_string(),
        generate,
        translate,
        chat_available: demo.is_some_and(|d| d.chat.is_some()),
        translation_available: demo.is_some_and(|d| d.translation.is_some()),
        ..PageView::default()
    }
}

async fn render_search(state: &AppState, params: SearchParams) -> Response {
    let demo_id = params.demo.unwrap_or_else(|| state.default_demo_id());

    let outcome = match state.demo(&demo_id) {
        Ok(demo) => {
            let query = params.q.unwrap_or_else(|| demo.default_search.clone());
            let result =
                run_interaction(state, demo, &query, params.generate, params.translate).await;
            (query, result)
        }
        Err(e) => (params.q.unwrap_or_default(), Err(e)),
    };

    let (query, result) = outcome;
    let mut view = page_view(state, &demo_id, &query, params.generate, params.translate);

    let status = match result {
        Ok(interaction) => {
            view.cards = interaction.cards;
            view.raw_response = interaction
                .raw_response
                .and_then(|raw| serde_json::to_string_pretty(&raw).ok());
            StatusCode::OK
        }
        Err(e) => {
            error!(error = %e, demo = %demo_id, "Interaction failed");
            record_failure(&e);
            view.error = Some(e.to_string());
            e.status_code()
        }
    };

    (status, Html(render_page(&view))).into_response()
}

#[instrument(skip(state))]
async fn index(State(state): State<AppState>) -> Response {
    render_search(&state, SearchParams::default()).await
}

#[instrument(skip(state))]
async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    render_search(&state, params).await
}

async fn fetch_raw(state: &AppState, params: SearchParams) -> Result<SearchOutcome, DemoError> {
    let demo_id = params.demo.unwrap_or_else(|| state.default_demo_id());
    let demo = state.demo(&demo_id)?;
    let query = params.q.unwrap_or_else(|| demo.default_search.clone());
    if query.trim().is_empty() {
        return Err(DemoError::InvalidRequest("Query cannot be empty".into()));
    }

    let gateway = state.registry.search_gateway(&demo.api_key, &demo.locale).await;
    gateway
        .search(
            &query,
            &demo.experience_key,
            &demo.vertical_key,
            demo.search_endpoint.as_deref(),
        )
        .await
}

/// Raw upstream envelope, as shown in the page's raw response view.
#[instrument(skip(state))]
async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    match fetch_raw(&state, params).await {
        Ok(outcome) => Json(outcome.raw).into_response(),
        Err(e) => {
            record_failure(&e);
            (e.status_code(), Json(json!({"error": e.to_string()}))).into_response()
        }
    }
}

async fn api_demos(State(state): State<AppState>) -> Json<Value> {
    let demos: Vec<DemoSummary<'_>> = state
        .config
        .demos
        .iter()
        .map(|demo| DemoSummary {
            id: &demo.id,
            name: &demo.name,
            default_search: &demo.default_search,
            chat: demo.chat.is_some(),
            translation: demo.translation.is_some(),
        })
        .collect();
    Json(json!(demos))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "demos": state.config.demos.len(),
        "mock": state.registry.is_mock(),
    }))
}
