//! Search session state machine
//!
//! A session progresses through:
//! IDLE → FILESELECTED → PALETTELOADING → PALETTEREADY → SEARCHING → RESULTSREADY
//! with SEARCHING falling back to PALETTEREADY on failure (results cleared,
//! error recorded) so the user can retry manually. There is no distinct
//! error state and no way to remain in SEARCHING past a search outcome.

use super::{ActiveFilters, FeatureWeights, SearchResult, WeightUpdate};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// No image selected yet
    Idle,
    /// Image received, palette extraction not started
    FileSelected,
    /// Palette extraction in flight
    PaletteLoading,
    /// Interactive: weights, filters and colors may be adjusted
    PaletteReady,
    /// Similarity search in flight
    Searching,
    /// Results available for display
    ResultsReady,
}

impl SessionState {
    /// Wire label, matching the serde tag
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "IDLE",
            SessionState::FileSelected => "FILESELECTED",
            SessionState::PaletteLoading => "PALETTELOADING",
            SessionState::PaletteReady => "PALETTEREADY",
            SessionState::Searching => "SEARCHING",
            SessionState::ResultsReady => "RESULTSREADY",
        }
    }
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_state: SessionState,
    pub new_state: SessionState,
    pub transitioned_at: DateTime<Utc>,
}

/// The retained subject image and its preview handle
///
/// The payload doubles as the preview resource: it is served back to the
/// browser for display and re-sent to the backend on color-refined
/// re-searches. Replacing or discarding the subject drops the bytes, which
/// is the release point of the preview handle.
#[derive(Debug, Clone)]
pub struct SubjectImage {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

/// One interactive search session (in-memory state)
///
/// Sessions are independent; no state is shared between them.
#[derive(Debug, Clone)]
pub struct SearchSession {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Current workflow state
    pub state: SessionState,

    /// Retained subject image, if one has been selected
    pub subject: Option<SubjectImage>,

    /// Colors extracted from the subject (may be empty on degradation)
    pub palette: Vec<String>,

    /// Selected palette color, or None for no color refinement
    pub selected_color: Option<String>,

    /// Per-feature percentage weights
    pub weights: FeatureWeights,

    /// Per-feature participation flags
    pub filters: ActiveFilters,

    /// Set when the last weight edit was rejected over the ceiling;
    /// cleared by the next accepted edit
    pub over_budget: bool,

    /// Current result set, replaced wholesale by each completed search
    pub results: Vec<SearchResult>,

    /// Results no longer reflect the current weights/filters
    pub results_stale: bool,

    /// Most recent degraded-search message, for inline display
    pub last_error: Option<String>,

    /// Session creation time
    pub created_at: DateTime<Utc>,

    /// Completion time of the last successful search
    pub last_searched_at: Option<DateTime<Utc>>,
}

impl SearchSession {
    /// Create a new idle session
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: SessionState::Idle,
            subject: None,
            palette: Vec::new(),
            selected_color: None,
            weights: FeatureWeights::default(),
            filters: ActiveFilters::default(),
            over_budget: false,
            results: Vec::new(),
            results_stale: false,
            last_error: None,
            created_at: Utc::now(),
            last_searched_at: None,
        }
    }

    /// Transition to a new state
    pub fn transition_to(&mut self, new_state: SessionState) -> StateTransition {
        let transition = StateTransition {
            session_id: self.session_id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        transition
    }

    /// Select a new subject image
    ///
    /// Releases the previous payload/preview handle, clears the palette,
    /// the color selection and any prior results, and moves to
    /// FILESELECTED. Palette extraction is sequenced by the coordinator.
    pub fn select_subject(&mut self, subject: SubjectImage) -> StateTransition {
        self.subject = Some(subject);
        self.palette.clear();
        self.selected_color = None;
        self.results.clear();
        self.results_stale = false;
        self.last_error = None;
        self.transition_to(SessionState::FileSelected)
    }

    /// Apply one weight edit, tracking the over-budget indicator and
    /// marking any displayed results stale
    pub fn set_weight(&mut self, feature: super::Feature, value: f64) -> WeightUpdate {
        let update = self.weights.set(feature, value);
        self.over_budget = !update.is_applied();
        if update.is_applied() {
            self.mark_results_stale();
        }
        update
    }

    /// Restore the default equal-split allocation
    pub fn reset_weights(&mut self) {
        self.weights.reset();
        self.over_budget = false;
        self.mark_results_stale();
    }

    /// Toggle one feature's participation, marking results stale
    pub fn set_filter(&mut self, feature: super::Feature, active: bool) {
        self.filters.set(feature, active);
        self.mark_results_stale();
    }

    /// Replace the result set after a completed search
    ///
    /// Wholesale replacement: if overlapping searches ever occur, the last
    /// response observed wins regardless of submission order.
    pub fn apply_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        self.results_stale = false;
        self.last_error = None;
        self.last_searched_at = Some(Utc::now());
    }

    /// Clear results after a failed search, recording the condition
    pub fn fail_search(&mut self, message: String) {
        self.results.clear();
        self.results_stale = false;
        self.last_error = Some(message);
    }

    /// Discard the retained payload and preview handle
    pub fn release_subject(&mut self) {
        self.subject = None;
        self.palette.clear();
        self.selected_color = None;
    }

    fn mark_results_stale(&mut self) {
        if !self.results.is_empty() {
            self.results_stale = true;
        }
    }
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Feature;
    use serde_json::json;

    fn subject(name: &str) -> SubjectImage {
        SubjectImage {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            data: Bytes::from_static(b"\x89PNG"),
        }
    }

    fn one_result(name: &str) -> Vec<SearchResult> {
        vec![serde_json::from_value(json!({ "filename": name, "similarity": 0.5 })).unwrap()]
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = SearchSession::new();
        assert_eq!(session.state, SessionState::Idle);
        assert!(session.subject.is_none());
        assert!(session.results.is_empty());
    }

    #[test]
    fn test_select_subject_resets_prior_state() {
        let mut session = SearchSession::new();
        session.select_subject(subject("first.png"));
        session.palette = vec!["#ff0000".to_string()];
        session.selected_color = Some("#ff0000".to_string());
        session.apply_results(one_result("match.png"));
        session.state = SessionState::ResultsReady;

        let transition = session.select_subject(subject("second.png"));
        assert_eq!(transition.new_state, SessionState::FileSelected);
        assert_eq!(session.subject.as_ref().unwrap().file_name, "second.png");
        assert!(session.palette.is_empty());
        assert!(session.selected_color.is_none());
        assert!(session.results.is_empty());
        assert!(!session.results_stale);
    }

    #[test]
    fn test_transition_records_old_and_new_state() {
        let mut session = SearchSession::new();
        session.select_subject(subject("a.png"));
        let transition = session.transition_to(SessionState::PaletteLoading);
        assert_eq!(transition.old_state, SessionState::FileSelected);
        assert_eq!(transition.new_state, SessionState::PaletteLoading);
        assert_eq!(session.state, SessionState::PaletteLoading);
    }

    #[test]
    fn test_weight_edit_marks_results_stale_but_keeps_them() {
        let mut session = SearchSession::new();
        session.apply_results(one_result("match.png"));
        assert!(!session.results_stale);

        let update = session.set_weight(Feature::Style, 10.0);
        assert!(update.is_applied());
        assert!(session.results_stale);
        assert_eq!(session.results.len(), 1);
    }

    #[test]
    fn test_rejected_edit_sets_over_budget_and_does_not_stale() {
        let mut session = SearchSession::new();
        session.apply_results(one_result("match.png"));

        let update = session.set_weight(Feature::Style, 90.0);
        assert!(!update.is_applied());
        assert!(session.over_budget);
        assert!(!session.results_stale);

        // Next accepted edit clears the indicator
        session.set_weight(Feature::Style, 10.0);
        assert!(!session.over_budget);
    }

    #[test]
    fn test_filter_toggle_marks_results_stale() {
        let mut session = SearchSession::new();
        session.apply_results(one_result("match.png"));
        session.set_filter(Feature::Emotion, false);
        assert!(session.results_stale);
        assert!(!session.filters.enabled(Feature::Emotion));
    }

    #[test]
    fn test_apply_results_is_last_write_wins() {
        let mut session = SearchSession::new();
        // Two overlapping searches: the response observed last replaces the
        // earlier one wholesale, regardless of submission order.
        session.apply_results(one_result("from-first-request.png"));
        session.apply_results(one_result("from-second-request.png"));
        assert_eq!(session.results.len(), 1);
        assert_eq!(
            session.results[0].filename.as_deref(),
            Some("from-second-request.png")
        );
    }

    #[test]
    fn test_fail_search_clears_results_and_records_error() {
        let mut session = SearchSession::new();
        session.apply_results(one_result("match.png"));
        session.fail_search("backend unreachable".to_string());
        assert!(session.results.is_empty());
        assert_eq!(session.last_error.as_deref(), Some("backend unreachable"));
    }

    #[test]
    fn test_release_subject_drops_payload_and_palette() {
        let mut session = SearchSession::new();
        session.select_subject(subject("a.png"));
        session.palette = vec!["#00ff00".to_string()];
        session.release_subject();
        assert!(session.subject.is_none());
        assert!(session.palette.is_empty());
        assert!(session.selected_color.is_none());
    }

    #[test]
    fn test_state_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&SessionState::PaletteReady).unwrap(),
            "\"PALETTEREADY\""
        );
    }
}
