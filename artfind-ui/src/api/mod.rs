//! HTTP API handlers for artfind-ui

pub mod health;
pub mod sessions;
pub mod sse;
pub mod uploads;

pub use health::health_routes;
pub use sessions::session_routes;
pub use sse::event_stream;
pub use uploads::upload_routes;
