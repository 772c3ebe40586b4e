//! Session API handlers
//!
//! The interactive surface the browser UI drives: create a session, select
//! an image, tune weights and filters, pick a palette color, trigger a
//! search, and read back the session snapshot with per-result breakdowns.

use crate::error::{ApiError, ApiResult};
use crate::models::{
    ActiveFilters, Feature, FeatureWeights, SearchSession, SessionState, SubjectImage,
    WeightUpdate,
};
use crate::services::{decompose, FeatureContribution};
use crate::AppState;
use artfind_common::events::ArtfindEvent;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

/// One result prepared for display
#[derive(Debug, Serialize)]
pub struct ResultView {
    /// Image reference, whichever of filepath/imageUrl the backend filled
    pub image: Option<String>,
    pub filename: Option<String>,
    /// Overall score on the 0-100 scale
    pub display_score: Option<f64>,
    /// Backend-supplied explanation or message text
    pub detail: Option<String>,
    /// Per-feature contribution breakdown, recomputed per snapshot
    pub breakdown: Vec<FeatureContribution>,
    pub tags: Vec<String>,
}

/// Full session snapshot for the UI
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub file_name: Option<String>,
    pub palette: Vec<String>,
    pub selected_color: Option<String>,
    pub weights: FeatureWeights,
    pub filters: ActiveFilters,
    pub total_weight: f64,
    pub over_budget: bool,
    pub results: Vec<ResultView>,
    pub results_stale: bool,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    fn from_session(session: &SearchSession) -> Self {
        let results = session
            .results
            .iter()
            .map(|r| ResultView {
                image: r.image_reference().map(str::to_string),
                filename: r.filename.clone(),
                display_score: r.display_score(),
                detail: r.message.clone().or_else(|| r.match_reason.clone()),
                breakdown: decompose(
                    r.match_reason.as_deref(),
                    &session.weights,
                    &session.filters,
                ),
                tags: r.tags.clone(),
            })
            .collect();

        Self {
            session_id: session.session_id,
            state: session.state,
            file_name: session.subject.as_ref().map(|s| s.file_name.clone()),
            palette: session.palette.clone(),
            selected_color: session.selected_color.clone(),
            weights: session.weights.clone(),
            filters: session.filters.clone(),
            total_weight: session.weights.total(),
            over_budget: session.over_budget,
            results,
            results_stale: session.results_stale,
            last_error: session.last_error.clone(),
        }
    }
}

/// Request body for a weight edit
#[derive(Debug, Deserialize)]
pub struct SetWeightRequest {
    pub value: f64,
}

/// Response for a weight edit
#[derive(Debug, Serialize)]
pub struct SetWeightResponse {
    pub applied: bool,
    /// Resting total after the edit (unchanged when rejected)
    pub total: f64,
    /// Total the rejected edit would have produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted_total: Option<f64>,
    pub weights: FeatureWeights,
}

/// Request body for a filter toggle
#[derive(Debug, Deserialize)]
pub struct SetFilterRequest {
    pub active: bool,
}

/// Request body for a palette color selection; null clears the selection
#[derive(Debug, Deserialize)]
pub struct SelectColorRequest {
    pub color: Option<String>,
}

async fn lookup(state: &AppState, id: Uuid) -> ApiResult<Arc<Mutex<SearchSession>>> {
    state
        .session(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", id)))
}

fn parse_feature(name: &str) -> ApiResult<Feature> {
    Feature::parse(name)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown feature: {}", name)))
}

/// POST /session
pub async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session = SearchSession::new();
    let session_id = session.session_id;

    state
        .sessions
        .write()
        .await
        .insert(session_id, Arc::new(Mutex::new(session)));

    state.event_bus.emit_lossy(ArtfindEvent::SessionCreated {
        session_id,
        timestamp: Utc::now(),
    });

    tracing::info!(session_id = %session_id, "Session created");

    Json(CreateSessionResponse { session_id })
}

/// GET /session/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_arc = lookup(&state, id).await?;
    let session = session_arc.lock().await;
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// POST /session/:id/image - select the subject image (multipart)
pub async fn select_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_arc = lookup(&state, id).await?;

    let mut subject: Option<SubjectImage> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .unwrap_or("upload")
            .to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file field: {}", e)))?;
        subject = Some(SubjectImage {
            file_name,
            content_type,
            data,
        });
        break;
    }

    let subject = subject
        .ok_or_else(|| ApiError::BadRequest("Missing file field in upload".to_string()))?;

    let mut session = session_arc.lock().await;
    state.coordinator.select_image(&mut session, subject).await;
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// PUT /session/:id/weights/:feature
pub async fn set_weight(
    State(state): State<AppState>,
    Path((id, feature)): Path<(Uuid, String)>,
    Json(request): Json<SetWeightRequest>,
) -> ApiResult<Json<SetWeightResponse>> {
    let feature = parse_feature(&feature)?;
    let session_arc = lookup(&state, id).await?;
    let mut session = session_arc.lock().await;

    let update = state.coordinator.set_weight(&mut session, feature, request.value);
    let (applied, attempted_total) = match update {
        WeightUpdate::Applied { .. } => (true, None),
        WeightUpdate::RejectedOverBudget { attempted_total } => (false, Some(attempted_total)),
    };

    Ok(Json(SetWeightResponse {
        applied,
        total: session.weights.total(),
        attempted_total,
        weights: session.weights.clone(),
    }))
}

/// POST /session/:id/reset - restore the default equal-split weights
pub async fn reset_weights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_arc = lookup(&state, id).await?;
    let mut session = session_arc.lock().await;
    session.reset_weights();
    tracing::debug!(session_id = %id, "Weights reset to default split");
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// PUT /session/:id/filters/:feature
pub async fn set_filter(
    State(state): State<AppState>,
    Path((id, feature)): Path<(Uuid, String)>,
    Json(request): Json<SetFilterRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let feature = parse_feature(&feature)?;
    let session_arc = lookup(&state, id).await?;
    let mut session = session_arc.lock().await;

    state.coordinator.set_filter(&mut session, feature, request.active);
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// POST /session/:id/search
pub async fn trigger_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_arc = lookup(&state, id).await?;
    state.coordinator.run_search(&session_arc).await?;
    let session = session_arc.lock().await;
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// PUT /session/:id/color - select a palette color and re-search
pub async fn select_color(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectColorRequest>,
) -> ApiResult<Json<SessionSnapshot>> {
    let session_arc = lookup(&state, id).await?;
    state
        .coordinator
        .select_color(&session_arc, request.color)
        .await?;
    let session = session_arc.lock().await;
    Ok(Json(SessionSnapshot::from_session(&session)))
}

/// GET /session/:id/preview - the retained subject image
pub async fn preview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Response> {
    let session_arc = lookup(&state, id).await?;
    let session = session_arc.lock().await;

    let subject = session.subject.as_ref().ok_or_else(|| {
        ApiError::NotFound("No image selected for this session".to_string())
    })?;

    Ok((
        [(header::CONTENT_TYPE, subject.content_type.clone())],
        subject.data.clone(),
    )
        .into_response())
}

/// GET /session/:id/breakdown/:index - one result's contribution breakdown
pub async fn result_breakdown(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> ApiResult<Json<Vec<FeatureContribution>>> {
    let session_arc = lookup(&state, id).await?;
    let session = session_arc.lock().await;

    let result = session.results.get(index).ok_or_else(|| {
        ApiError::NotFound(format!("No result at index {}", index))
    })?;

    Ok(Json(decompose(
        result.match_reason.as_deref(),
        &session.weights,
        &session.filters,
    )))
}

/// DELETE /session/:id - discard the session and release its payload
pub async fn discard_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let removed = state.sessions.write().await.remove(&id);

    match removed {
        Some(session_arc) => {
            // Dropping the map entry releases the payload once the last
            // in-flight handler finishes; clearing early releases it now.
            session_arc.lock().await.release_subject();
            state.event_bus.emit_lossy(ArtfindEvent::SessionDiscarded {
                session_id: id,
                timestamp: Utc::now(),
            });
            tracing::info!(session_id = %id, "Session discarded");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError::NotFound(format!("Session {} not found", id))),
    }
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/session/:id", get(get_session).delete(discard_session))
        .route("/session/:id/image", post(select_image))
        .route("/session/:id/weights/:feature", put(set_weight))
        .route("/session/:id/reset", post(reset_weights))
        .route("/session/:id/filters/:feature", put(set_filter))
        .route("/session/:id/search", post(trigger_search))
        .route("/session/:id/color", put(select_color))
        .route("/session/:id/preview", get(preview))
        .route("/session/:id/breakdown/:index", get(result_breakdown))
}
