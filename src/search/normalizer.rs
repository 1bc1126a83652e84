//! Turns raw search results and direct answers into display records.
//!
//! A result whose matched segment is exactly the entity name is a "title match":
//! the backend matched on the name field, so the card shows the start of the body
//! instead of repeating the name. Other segments are shown verbatim between
//! ellipsis markers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::model::{DirectAnswer, SearchResult};
use crate::error::DemoError;

/// Score suffix for results that matched on the name field.
pub const MATCHED_ON_NAME: &str = " (matched on name)";

/// Default number of body characters kept for fallback segments.
pub const DEFAULT_TRUNCATE_CHARS: usize = 250;

/// A nested key path into a result's data, e.g. `bodyV2.markdown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parse a dotted path.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('.')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    /// Resolve the path to a string value. Missing keys, non-objects along the
    /// way and non-string leaves all count as a miss.
    pub fn resolve<'a>(&self, data: &'a Map<String, Value>) -> Option<&'a str> {
        let (first, rest) = self.0.split_first()?;
        let mut current = data.get(first)?;
        for key in rest {
            current = current.as_object()?.get(key)?;
        }
        current.as_str()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FieldPath::parse(&raw))
    }
}

/// Per-tenant normalization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Data field holding the entity name
    pub name_field: String,
    /// Body field candidates, first one present wins
    pub body_paths: Vec<FieldPath>,
    /// Keyword-backend snippet field used when a result has no segment
    pub snippet_field: Option<String>,
    /// Characters of body text kept for fallback segments
    pub truncate_chars: usize,
    /// Pull the result backing the direct answer up under the answer card
    pub boost_direct_answer: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            name_field: "name".to_string(),
            body_paths: vec![
                FieldPath::parse("bodyV2.markdown"),
                FieldPath::parse("body"),
                FieldPath::parse("description"),
            ],
            snippet_field: Some("s_snippet".to_string()),
            truncate_chars: DEFAULT_TRUNCATE_CHARS,
            boost_direct_answer: false,
        }
    }
}

impl NormalizerConfig {
    fn resolve_body<'a>(&self, data: &'a Map<String, Value>) -> Option<&'a str> {
        self.body_paths.iter().find_map(|path| path.resolve(data))
    }

    /// First `truncate_chars` characters of the body followed by `" ..."`,
    /// or the empty string when no body field resolves.
    fn body_fallback(&self, data: &Map<String, Value>) -> String {
        match self.resolve_body(data) {
            Some(body) => {
                let truncated: String = body.chars().take(self.truncate_chars).collect();
                format!("{truncated} ...")
            }
            None => String::new(),
        }
    }
}

/// Score shown on a result card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayScore {
    Numeric(f64),
    Annotated(String),
}

impl fmt::Display for DisplayScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayScore::Numeric(score) => write!(f, "{}", format_score(*score)),
            DisplayScore::Annotated(text) => f.write_str(text),
        }
    }
}

/// Whole scores keep one decimal place so `1.0` does not render as `1`.
fn format_score(score: f64) -> String {
    if score.is_finite() && score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayResult {
    pub display_name: String,
    pub display_segment: String,
    pub display_score: Option<DisplayScore>,
    pub is_title_match: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightedSnippet {
    pub before: String,
    pub highlighted: String,
    pub after: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDirectAnswer {
    pub display_answer: String,
    pub highlighted_snippet: HighlightedSnippet,
    pub source_name: String,
    pub source_uid: Option<String>,
}

pub fn normalize_result(result: &SearchResult, config: &NormalizerConfig) -> DisplayResult {
    let name = result.field_str(&config.name_field).unwrap_or_default();

    match &result.segment {
        Some(segment) => {
            let raw = segment.text.trim();
            if raw == name {
                DisplayResult {
                    display_name: name.to_string(),
                    display_segment: config.body_fallback(&result.data),
                    display_score: Some(DisplayScore::Annotated(format!(
                        "{}{MATCHED_ON_NAME}",
                        format_score(segment.score)
                    ))),
                    is_title_match: true,
                }
            } else {
                DisplayResult {
                    display_name: name.to_string(),
                    display_segment: format!("... {raw} ..."),
                    display_score: Some(DisplayScore::Numeric(segment.score)),
                    is_title_match: false,
                }
            }
        }
        None => {
            let snippet = config
                .snippet_field
                .as_deref()
                .and_then(|field| result.field_str(field));
            DisplayResult {
                display_name: name.to_string(),
                display_segment: match snippet {
                    Some(snippet) => snippet.to_string(),
                    None => config.body_fallback(&result.data),
                },
                display_score: None,
                is_title_match: false,
            }
        }
    }
}

/// Normalize a raw direct answer. Only the first matched substring is used.
pub fn normalize_direct_answer(raw: &Value) -> Result<DisplayDirectAnswer, DemoError> {
    let direct_answer: DirectAnswer = serde_json::from_value(raw.clone())
        .map_err(|e| DemoError::MalformedResponse(format!("directAnswer: {e}")))?;

    let snippet = &direct_answer.answer.snippet;
    let span = snippet
        .matched_substrings
        .first()
        .ok_or_else(|| DemoError::missing("directAnswer.answer.snippet.matchedSubstrings[0]"))?;

    let highlighted_snippet = split_snippet(&snippet.value, span.offset, span.length)?;

    let answer = match &direct_answer.answer.value {
        Some(Value::String(value)) => value.clone(),
        Some(Value::Null) | None => highlighted_snippet.highlighted.clone(),
        Some(other) => other.to_string(),
    };

    let source_uid = match &direct_answer.related_item.data.uid {
        Some(Value::String(uid)) => Some(uid.clone()),
        Some(Value::Number(uid)) => Some(uid.to_string()),
        _ => None,
    };

    Ok(DisplayDirectAnswer {
        display_answer: single_line(&answer),
        highlighted_snippet,
        source_name: direct_answer.related_item.data.field_values.name,
        source_uid,
    })
}

/// Split `value` around the span `[offset, offset + length)`, counted in characters.
pub fn split_snippet(
    value: &str,
    offset: usize,
    length: usize,
) -> Result<HighlightedSnippet, DemoError> {
    let char_count = value.chars().count();
    let end = offset
        .checked_add(length)
        .filter(|end| *end <= char_count)
        .ok_or_else(|| {
            DemoError::MalformedResponse(format!(
                "matched substring {offset}+{length} exceeds snippet length {char_count}"
            ))
        })?;

    let byte_index = |chars: usize| {
        value
            .char_indices()
            .nth(chars)
            .map(|(idx, _)| idx)
            .unwrap_or(value.len())
    };
    let start_byte = byte_index(offset);
    let end_byte = byte_index(end);

    Ok(HighlightedSnippet {
        before: value[..start_byte].to_string(),
        highlighted: value[start_byte..end_byte].to_string(),
        after: value[end_byte..].to_string(),
    })
}

fn single_line(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// Move the result backing the direct answer out of the ranked list.
///
/// A result qualifies when its uid equals the answer's related item uid AND its
/// segment contains the (non-empty) highlighted span. The uid alone is not enough since uids
/// can repeat across verticals.
pub fn boost(
    answer: &DisplayDirectAnswer,
    mut results: Vec<SearchResult>,
) -> (Option<SearchResult>, Vec<SearchResult>) {
    let Some(uid) = answer.source_uid.as_deref() else {
        return (None, results);
    };
    let needle = answer.highlighted_snippet.highlighted.as_str();
    if needle.is_empty() {
        return (None, results);
    }

    let position = results.iter().position(|result| {
        result.uid().as_deref() == Some(uid)
            && result
                .segment
                .as_ref()
                .is_some_and(|segment| segment.text.contains(needle))
    });

    match position {
        Some(idx) => {
            let boosted = results.remove(idx);
            (Some(boosted), results)
        }
        None => (None, results),
    }
}
