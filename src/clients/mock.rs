//! Fixture-backed clients for running the demo without upstream credentials.

use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::chat::{AnswerGenerator, ConverseRequest};
use super::gateway::{SearchGateway, SearchOutcome};
use super::translate::Translator;
use crate::error::DemoError;
use crate::search::SearchResponse;

/// Search gateway that answers from built-in sample data.
///
/// The `book-search` experience returns vector-style results with segments and
/// a direct answer; every other experience returns keyword-style results that
/// only carry a snippet field.
pub struct MockSearchGateway {
    name: String,
}

impl MockSearchGateway {
    pub fn new() -> Self {
        info!("Initializing MockSearchGateway with sample tenant data");
        Self {
            name: "mock".to_string(),
        }
    }

    fn book_results() -> Vec<Value> {
        vec![
            json!({
                "data": {
                    "uid": "1001",
                    "name": "Albus Dumbledore",
                    "bodyV2": {"markdown": "Albus Percival Wulfric Brian Dumbledore is the \
                        headmaster of Hogwarts School of Witchcraft and Wizardry, widely \
                        considered the greatest wizard of his age. He defeated the dark \
                        wizard Grindelwald in 1945 and founded the Order of the Phoenix \
                        to oppose Voldemort. He is known for his fondness for lemon drops."}
                },
                "segment": {"text": "Albus Dumbledore", "score": 0.93}
            }),
            json!({
                "data": {
                    "uid": "1002",
                    "name": "Harry Potter and the Philosopher's Stone",
                    "bodyV2": {"markdown": "The first book in the series."}
                },
                "segment": {
                    "text": "  Professor Dumbledore was the headmaster of Hogwarts, and \
                        he had a twinkle in his eye.  ",
                    "score": 0.87
                }
            }),
            json!({
                "data": {
                    "uid": "1003",
                    "name": "Harry Potter and the Half-Blood Prince",
                    "bodyV2": {"markdown": "The sixth book in the series."}
                },
                "segment": {
                    "text": "Dumbledore showed Harry the memories in the Pensieve.",
                    "score": 0.81
                }
            }),
        ]
    }

    fn book_direct_answer() -> Value {
        json!({
            "type": "FEATURED_SNIPPET",
            "answer": {
                "snippet": {
                    "value": "Professor Dumbledore was the headmaster of Hogwarts, and he \
                        had a twinkle in his eye.",
                    "matchedSubstrings": [{"offset": 29, "length": 22}]
                }
            },
            "relatedItem": {
                "data": {
                    "uid": "1002",
                    "fieldValues": {"name": "Harry Potter and the Philosopher's Stone"}
                }
            }
        })
    }

    fn guide_results() -> Vec<Value> {
        vec![
            json!({
                "data": {
                    "uid": "2001",
                    "name": "Resetting the ice maker",
                    "s_snippet": "Press and hold the Test button for 3 seconds until you \
                        hear a chime.",
                    "body": "Open the freezer door and locate the ice maker."
                }
            }),
            json!({
                "data": {
                    "uid": "2002",
                    "name": "Ice maker not producing ice",
                    "body": "Make sure the water supply line is connected and the ice \
                        maker is switched on."
                }
            }),
        ]
    }

    fn envelope(&self, query: &str, experience_key: &str) -> Value {
        let query_lower = query.to_lowercase();
        let (results, direct_answer) = if experience_key == "book-search" {
            let answer = query_lower
                .contains("dumbledore")
                .then(Self::book_direct_answer);
            (Self::book_results(), answer)
        } else {
            (Self::guide_results(), None)
        };

        let mut response = json!({
            "results": results,
            "resultsCount": results.len(),
        });
        if let Some(answer) = direct_answer {
            response["directAnswer"] = answer;
        }
        json!({"meta": {"uuid": "mock"}, "response": response})
    }
}

impl Default for MockSearchGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchGateway for MockSearchGateway {
    async fn search(
        &self,
        query: &str,
        experience_key: &str,
        vertical_key: &str,
        endpoint_override: Option<&str>,
    ) -> Result<SearchOutcome, DemoError> {
        let start = Instant::now();

        if query.trim().is_empty() {
            return Err(DemoError::InvalidRequest("Query cannot be empty".into()));
        }

        let raw = self.envelope(query, experience_key);
        let response = SearchResponse::from_envelope(&raw)?;
        let took_ms = start.elapsed().as_millis() as u64;

        info!(
            query = %query,
            experience_key,
            vertical_key,
            endpoint_override = ?endpoint_override,
            results = response.results.len(),
            "Mock search completed"
        );

        Ok(SearchOutcome {
            raw,
            response,
            took_ms,
        })
    }

    fn backend(&self) -> &str {
        &self.name
    }
}

/// Answer generator that summarizes the top results without a network call.
#[derive(Debug, Default)]
pub struct MockAnswerGenerator;

#[async_trait]
impl AnswerGenerator for MockAnswerGenerator {
    async fn converse(&self, request: ConverseRequest<'_>) -> Result<String, DemoError> {
        let names: Vec<&str> = request
            .search_context
            .results
            .iter()
            .filter_map(|result| result.field_str("name"))
            .take(2)
            .collect();
        if names.is_empty() {
            return Ok(format!("I could not find anything about \"{}\".", request.query));
        }
        Ok(format!(
            "Based on {}, here is what I found about \"{}\".",
            names.join(" and "),
            request.query
        ))
    }
}

/// Translator that tags text with the target locale.
#[derive(Debug, Default)]
pub struct MockTranslator;

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> Result<String, DemoError> {
        Ok(format!("[{target_locale}] {text}"))
    }
}
