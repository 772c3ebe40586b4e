//! Match-reason decomposition
//!
//! The backend explains each match with a free-text string like
//! "Style 0.80 × 25%, Texture 0.60 × 25%". The exact punctuation is not
//! guaranteed: the separator may be `×`, `x` or the word "weight", the
//! similarity or the weight may be missing, and feature names drift between
//! "color", "colorPalette" and "palette". This module is the only place
//! that couples to that format; everything else consumes the structured
//! contributions. When the text yields nothing, the requested weight vector
//! stands in so the breakdown display is never empty.

use crate::models::{ActiveFilters, Feature, FeatureWeights};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// One per-feature slice of a result's overall score
///
/// Derived per render from the explanation text; never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureContribution {
    pub feature: Feature,
    /// Feature similarity, 0.0-1.0 (1.0 when absent from the text)
    pub similarity: f64,
    /// Weight percentage applied to the feature (0 when absent)
    pub weight_percent: f64,
    /// round(similarity × weight_percent)
    pub contribution: i64,
}

// Feature name, optional similarity, then an optional "×|x|weight <pct>%"
// tail. The filler class before the separator must not cross a comma or a
// digit, or one token would swallow the next token's weight.
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(style|texture|colou?r(?:\s*palette)?|palette|emotion)\b[\s:=-]*(\d+(?:\.\d+)?)?(?:[^,\d%]*?(?:[×x]|weight)\s*(\d+(?:\.\d+)?)\s*%)?",
    )
    .expect("match-reason token regex is valid")
});

/// Parse an explanation string into per-feature contributions
///
/// Matching is case-insensitive on feature names; a missing similarity
/// defaults to 1.0 and a missing weight to 0. The first occurrence of a
/// feature wins and the output is imposed into canonical order regardless
/// of the order features appear in the text. An unparseable or empty
/// string yields an empty vector; see `decompose` for the fallback.
pub fn parse_match_reason(text: &str) -> Vec<FeatureContribution> {
    let mut found: [Option<FeatureContribution>; 4] = [None, None, None, None];

    for captures in TOKEN_RE.captures_iter(text) {
        let feature = match captures.get(1).and_then(|m| Feature::parse(m.as_str())) {
            Some(feature) => feature,
            None => continue,
        };

        let similarity = captures
            .get(2)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(1.0);
        let weight_percent = captures
            .get(3)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        let slot = match feature {
            Feature::Style => 0,
            Feature::Texture => 1,
            Feature::Color => 2,
            Feature::Emotion => 3,
        };
        if found[slot].is_none() {
            found[slot] = Some(FeatureContribution {
                feature,
                similarity,
                weight_percent,
                contribution: (similarity * weight_percent).round() as i64,
            });
        }
    }

    found.into_iter().flatten().collect()
}

/// Synthesize contributions from the requested weight vector
///
/// Used when the explanation text yields no structured matches: one
/// contribution per active feature, valued at its submitted weight, so the
/// breakdown still shows something proportional to the request.
pub fn fallback_contributions(
    weights: &FeatureWeights,
    filters: &ActiveFilters,
) -> Vec<FeatureContribution> {
    Feature::ALL
        .iter()
        .filter(|f| filters.enabled(**f))
        .map(|f| {
            let weight_percent = weights.get(*f);
            FeatureContribution {
                feature: *f,
                similarity: 1.0,
                weight_percent,
                contribution: weight_percent.round() as i64,
            }
        })
        .collect()
}

/// Decompose a result's explanation, falling back to the requested weights
pub fn decompose(
    explanation: Option<&str>,
    weights: &FeatureWeights,
    filters: &ActiveFilters,
) -> Vec<FeatureContribution> {
    let parsed = explanation.map(parse_match_reason).unwrap_or_default();
    if parsed.is_empty() {
        fallback_contributions(weights, filters)
    } else {
        parsed
    }
}
