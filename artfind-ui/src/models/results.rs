//! Search result records and response-shape normalization
//!
//! The backend's response shape has been inconsistent across deployments:
//! a bare result object, an array of result objects, or either of those
//! wrapped in a `results` field. `normalize_results` folds every shape into
//! one ordered sequence and degrades to an empty sequence on anything it
//! does not recognize, so no shape drift can propagate a parse error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One ranked match from the similarity backend
///
/// Either `filepath` or `image_url` is populated depending on the backend
/// revision; `score` is pre-scaled 0-100 while `similarity` is a 0-1
/// fraction, and only one of the two is normally present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: Option<i64>,
    pub filename: Option<String>,
    pub filepath: Option<String>,
    pub image_url: Option<String>,
    pub score: Option<f64>,
    pub similarity: Option<f64>,
    pub match_reason: Option<String>,
    pub message: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SearchResult {
    /// Display score on the 0-100 scale
    ///
    /// Prefers the pre-scaled `score`; falls back to `similarity` x 100.
    pub fn display_score(&self) -> Option<f64> {
        self.score.or_else(|| self.similarity.map(|s| s * 100.0))
    }

    /// The image reference to render, whichever field the backend filled
    pub fn image_reference(&self) -> Option<&str> {
        self.filepath.as_deref().or(self.image_url.as_deref())
    }
}

/// Fold any accepted response shape into an ordered result sequence
///
/// Accepted shapes: a bare object, an array of objects, or an object whose
/// `results` field holds either of those. Non-object array elements are
/// dropped; unrecognized top-level shapes produce an empty sequence.
pub fn normalize_results(body: &Value) -> Vec<SearchResult> {
    match body {
        Value::Object(map) if map.contains_key("results") => normalize_results(&map["results"]),
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Value::Object(_) => serde_json::from_value(body.clone()).ok().into_iter().collect(),
        _ => Vec::new(),
    }
}
