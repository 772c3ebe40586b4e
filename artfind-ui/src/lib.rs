//! artfind-ui library interface
//!
//! Exposes the application state, router construction, and the session
//! engine for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use artfind_common::events::EventBus;
use models::SearchSession;
use services::SearchCoordinator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Live search sessions, each independently lockable
    pub sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<SearchSession>>>>>,
    /// Session coordinator owning the backend clients and credential
    pub coordinator: Arc<SearchCoordinator>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(coordinator: SearchCoordinator, event_bus: EventBus) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            coordinator: Arc::new(coordinator),
            event_bus,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Look up a live session by id
    pub async fn session(&self, id: Uuid) -> Option<Arc<Mutex<SearchSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::upload_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
