//! Wire types for vertical search responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DemoError;

/// Matched text span and relevance score for a result.
///
/// Only present for similarity (vector) matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    pub score: f64,
}

/// A single ranked result from a vertical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Entity fields as returned by the backend ("name", "uid", body fields...)
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<Segment>,
}

impl SearchResult {
    /// String value of a top-level data field.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Entity uid. The backend sends it as a string but numbers are tolerated.
    pub fn uid(&self) -> Option<String> {
        match self.data.get("uid")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Parsed `response` member of a vertical query envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub results_count: u64,
    /// Left as raw JSON; shape checks happen when it is normalized.
    pub direct_answer: Option<Value>,
}

impl SearchResponse {
    /// Extract the search response from the full upstream envelope
    /// `{ "response": { "results": [...], "resultsCount": N, "directAnswer": {...} } }`.
    pub fn from_envelope(envelope: &Value) -> Result<Self, DemoError> {
        let response = envelope
            .get("response")
            .ok_or_else(|| DemoError::missing("response"))?;

        let results = response
            .get("results")
            .ok_or_else(|| DemoError::missing("response.results"))?;
        let results: Vec<SearchResult> = serde_json::from_value(results.clone())
            .map_err(|e| DemoError::MalformedResponse(format!("response.results: {e}")))?;

        let results_count = response
            .get("resultsCount")
            .and_then(Value::as_u64)
            .unwrap_or(results.len() as u64);

        let direct_answer = response
            .get("directAnswer")
            .filter(|v| !v.is_null())
            .cloned();

        Ok(Self {
            results,
            results_count,
            direct_answer,
        })
    }
}

/// Direct answer as sent by the search backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectAnswer {
    pub answer: Answer,
    pub related_item: RelatedItem,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    #[serde(default)]
    pub value: Option<Value>,
    pub snippet: Snippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub value: String,
    pub matched_substrings: Vec<MatchedSubstring>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MatchedSubstring {
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedItem {
    pub data: RelatedItemData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedItemData {
    #[serde(default)]
    pub uid: Option<Value>,
    pub field_values: RelatedFieldValues,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelatedFieldValues {
    pub name: String,
}
