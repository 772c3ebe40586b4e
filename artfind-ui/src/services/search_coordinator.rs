//! Search session coordinator
//!
//! Sequences a session through its states in response to user actions:
//! image selection triggers palette extraction, weight and filter edits
//! stay in place, a search submission walks the session through SEARCHING
//! and back to an interactive state on either outcome. The session lock is
//! released while a search is in flight, so a second trigger observes
//! SEARCHING and is refused with a conflict; if that contract is ever
//! bypassed, responses apply last-write-wins on arrival.

use crate::error::ApiError;
use crate::models::{
    normalize_results, SearchSession, SessionState, StateTransition, SubjectImage, WeightUpdate,
};
use crate::models::Feature;
use crate::services::{
    BulkUploadClient, PaletteClient, SearchClient, SearchRequest, UploadOutcome,
};
use artfind_common::events::{ArtfindEvent, EventBus};
use artfind_common::Credential;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Coordinator owning the backend clients and the resolved credential
pub struct SearchCoordinator {
    palette_client: Option<PaletteClient>,
    search_client: Option<SearchClient>,
    bulk_upload_client: Option<BulkUploadClient>,
    credential: Option<Credential>,
    event_bus: EventBus,
}

impl SearchCoordinator {
    pub fn new(base_url: &str, credential: Option<Credential>, event_bus: EventBus) -> Self {
        // Client construction can fail, so each is wrapped in Option
        let palette_client = PaletteClient::new(base_url).ok();
        let search_client = SearchClient::new(base_url).ok();
        let bulk_upload_client = BulkUploadClient::new(base_url).ok();

        if search_client.is_none() {
            tracing::error!("Failed to initialize search client; searches will be refused");
        }
        if credential.is_none() {
            tracing::warn!("No credential configured; backend calls will be refused up front");
        }

        Self {
            palette_client,
            search_client,
            bulk_upload_client,
            credential,
            event_bus,
        }
    }

    /// Select a new subject image and extract its palette
    ///
    /// The session always reaches PALETTEREADY, with an empty palette when
    /// extraction is unavailable or fails. Color refinement is simply
    /// absent for that image; nothing is retried.
    pub async fn select_image(&self, session: &mut SearchSession, subject: SubjectImage) {
        let snapshot = subject.clone();
        let transition = session.select_subject(subject);
        self.emit_transition(&transition);

        tracing::info!(
            session_id = %session.session_id,
            file = %snapshot.file_name,
            size_bytes = snapshot.data.len(),
            "Subject image selected, prior results cleared"
        );

        let transition = session.transition_to(SessionState::PaletteLoading);
        self.emit_transition(&transition);

        let palette = match (&self.palette_client, &self.credential) {
            (Some(client), Some(credential)) => {
                match client.extract(credential, &snapshot).await {
                    Ok(colors) => colors,
                    Err(e) => {
                        tracing::warn!(
                            session_id = %session.session_id,
                            error = %e,
                            "Palette extraction failed, continuing with empty palette"
                        );
                        Vec::new()
                    }
                }
            }
            _ => {
                tracing::warn!(
                    session_id = %session.session_id,
                    "Palette extraction unavailable, continuing with empty palette"
                );
                Vec::new()
            }
        };

        session.palette = palette;

        let transition = session.transition_to(SessionState::PaletteReady);
        self.emit_transition(&transition);

        self.event_bus.emit_lossy(ArtfindEvent::PaletteExtracted {
            session_id: session.session_id,
            color_count: session.palette.len(),
            timestamp: Utc::now(),
        });
    }

    /// Apply one weight edit
    ///
    /// Rejection over the 100% ceiling is signalled, broadcast for UI
    /// feedback, and leaves the weight unchanged. No state transition.
    pub fn set_weight(
        &self,
        session: &mut SearchSession,
        feature: Feature,
        value: f64,
    ) -> WeightUpdate {
        let update = session.set_weight(feature, value);

        match update {
            WeightUpdate::Applied { total } => {
                tracing::debug!(
                    session_id = %session.session_id,
                    feature = feature.wire_name(),
                    value,
                    total,
                    "Weight applied"
                );
            }
            WeightUpdate::RejectedOverBudget { attempted_total } => {
                tracing::debug!(
                    session_id = %session.session_id,
                    feature = feature.wire_name(),
                    value,
                    attempted_total,
                    "Weight rejected, total would exceed 100"
                );
                self.event_bus.emit_lossy(ArtfindEvent::WeightRejected {
                    session_id: session.session_id,
                    feature: feature.wire_name().to_string(),
                    attempted_total,
                    timestamp: Utc::now(),
                });
            }
        }

        update
    }

    /// Toggle one feature's participation. No state transition.
    pub fn set_filter(&self, session: &mut SearchSession, feature: Feature, active: bool) {
        session.set_filter(feature, active);
        tracing::debug!(
            session_id = %session.session_id,
            feature = feature.wire_name(),
            active,
            "Filter toggled"
        );
    }

    /// Select a palette color (or clear the selection) and re-search
    ///
    /// Re-uses the retained subject payload; no re-upload happens.
    pub async fn select_color(
        &self,
        session_arc: &Arc<Mutex<SearchSession>>,
        color: Option<String>,
    ) -> Result<(), ApiError> {
        {
            let mut session = session_arc.lock().await;
            if session.subject.is_none() {
                return Err(ApiError::BadRequest(
                    "No image selected. Upload an image before choosing a color.".to_string(),
                ));
            }
            if let Some(color) = &color {
                if !session.palette.contains(color) {
                    return Err(ApiError::BadRequest(
                        "Selected color is not part of the extracted palette.".to_string(),
                    ));
                }
            }
            session.selected_color = color;
        }

        self.run_search(session_arc).await
    }

    /// Submit a similarity search for the session's current selections
    ///
    /// Precondition failures (no image, no active filter, no credential, a
    /// search already pending) are refused before any network I/O. A
    /// transient backend failure is not an error at this boundary: results
    /// are cleared, the condition is recorded on the session, and the
    /// session returns to PALETTEREADY for a manual retry.
    pub async fn run_search(
        &self,
        session_arc: &Arc<Mutex<SearchSession>>,
    ) -> Result<(), ApiError> {
        let client = match &self.search_client {
            Some(client) => client,
            None => {
                return Err(ApiError::Internal(
                    "Search client unavailable".to_string(),
                ))
            }
        };

        // Phase 1: guards and payload assembly under the session lock
        let (request, credential, session_id) = {
            let mut session = session_arc.lock().await;

            if session.state == SessionState::Searching {
                return Err(ApiError::Conflict(
                    "A search is already in progress for this session.".to_string(),
                ));
            }

            let subject = match &session.subject {
                Some(subject) => subject,
                None => {
                    return Err(ApiError::BadRequest(
                        "No image selected. Upload an image before searching.".to_string(),
                    ))
                }
            };

            if !session.filters.any_enabled() {
                return Err(ApiError::BadRequest(
                    "No filters selected. Please enable at least one filter.".to_string(),
                ));
            }

            let credential = match &self.credential {
                Some(credential) => credential.clone(),
                None => {
                    return Err(ApiError::BadRequest(
                        "No API token configured; cannot contact the search backend.".to_string(),
                    ))
                }
            };

            let normalized = session.weights.normalize(&session.filters);
            let request = SearchRequest::build(
                subject,
                session.selected_color.as_deref(),
                &normalized,
                &session.filters,
            );

            let transition = session.transition_to(SessionState::Searching);
            self.emit_transition(&transition);
            self.event_bus.emit_lossy(ArtfindEvent::SearchStarted {
                session_id: session.session_id,
                timestamp: Utc::now(),
            });

            (request, credential, session.session_id)
        };

        // Phase 2: the one suspension point, with the session lock released
        let outcome = client.submit(&credential, request).await;

        // Phase 3: apply whichever outcome arrived
        let mut session = session_arc.lock().await;
        match outcome {
            Ok(body) => {
                let results = normalize_results(&body);
                tracing::info!(
                    session_id = %session_id,
                    result_count = results.len(),
                    "Search completed"
                );
                let count = results.len();
                session.apply_results(results);
                let transition = session.transition_to(SessionState::ResultsReady);
                self.emit_transition(&transition);
                self.event_bus.emit_lossy(ArtfindEvent::SearchCompleted {
                    session_id,
                    result_count: count,
                    timestamp: Utc::now(),
                });
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Search failed, clearing results"
                );
                session.fail_search(e.to_string());
                let transition = session.transition_to(SessionState::PaletteReady);
                self.emit_transition(&transition);
                self.event_bus.emit_lossy(ArtfindEvent::SearchFailed {
                    session_id,
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(())
    }

    /// Upload a batch of files to the backend library
    ///
    /// Backend failure degrades to uniform per-file failure rather than an
    /// HTTP error; the result is an opaque pass/fail signal per file.
    pub async fn bulk_upload(
        &self,
        files: Vec<SubjectImage>,
    ) -> Result<Vec<UploadOutcome>, ApiError> {
        if files.is_empty() {
            return Err(ApiError::BadRequest("No files provided.".to_string()));
        }

        let credential = match &self.credential {
            Some(credential) => credential,
            None => {
                return Err(ApiError::BadRequest(
                    "No API token configured; cannot contact the search backend.".to_string(),
                ))
            }
        };

        let client = self.bulk_upload_client.as_ref().ok_or_else(|| {
            ApiError::Internal("Bulk upload client unavailable".to_string())
        })?;

        match client.upload_all(credential, &files).await {
            Ok(outcomes) => Ok(outcomes),
            Err(e) => {
                tracing::warn!(error = %e, "Bulk upload failed");
                Ok(files
                    .iter()
                    .map(|file| UploadOutcome {
                        file_name: file.file_name.clone(),
                        ok: false,
                    })
                    .collect())
            }
        }
    }

    fn emit_transition(&self, transition: &StateTransition) {
        self.event_bus.emit_lossy(ArtfindEvent::SessionStateChanged {
            session_id: transition.session_id,
            old_state: transition.old_state.as_str().to_string(),
            new_state: transition.new_state.as_str().to_string(),
            timestamp: transition.transitioned_at,
        });
    }
}
