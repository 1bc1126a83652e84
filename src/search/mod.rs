//! Search response model and normalization into display records.

mod model;
mod normalizer;

pub use model::{
    Answer, DirectAnswer, MatchedSubstring, RelatedItem, SearchResponse, SearchResult, Segment,
    Snippet,
};
pub use normalizer::{
    boost, normalize_direct_answer, normalize_result, split_snippet, DisplayDirectAnswer,
    DisplayResult, DisplayScore, FieldPath, HighlightedSnippet, NormalizerConfig,
    DEFAULT_TRUNCATE_CHARS, MATCHED_ON_NAME,
};
