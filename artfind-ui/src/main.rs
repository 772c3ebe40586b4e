//! artfind-ui - Art Search User Interface Microservice
//!
//! **Module Identity:**
//! - Name: artfind-ui (User Interface)
//! - Port: 5741
//!
//! Owns interactive search sessions for the browser UI: subject image
//! selection, palette extraction, per-feature weight allocation, search
//! submission against the external similarity backend, and per-result
//! match-reason breakdowns.

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use artfind_common::events::EventBus;
use artfind_ui::config::{ServiceConfig, LISTEN_ADDR};
use artfind_ui::services::SearchCoordinator;
use artfind_ui::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting artfind-ui (User Interface) microservice");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Resolve backend URL and credential (CLI -> ENV -> TOML)
    let args: Vec<String> = std::env::args().collect();
    let config = ServiceConfig::resolve(&args);
    info!("Backend: {}", config.backend_url);

    // Create event bus for SSE broadcasting
    let event_bus = EventBus::new(100);
    info!("Event bus initialized");

    // Create the session coordinator and application state
    let coordinator = SearchCoordinator::new(
        &config.backend_url,
        config.credential.clone(),
        event_bus.clone(),
    );
    let state = AppState::new(coordinator, event_bus);

    // Build router
    let app = artfind_ui::build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;
    info!("Listening on http://{}", LISTEN_ADDR);
    info!("Health check: http://{}/health", LISTEN_ADDR);

    axum::serve(listener, app).await?;

    Ok(())
}
