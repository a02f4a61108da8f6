//! REST API for the announcer player
//!
//! Three groups of endpoints:
//! - generation: submit text, read generation status
//! - audio: serve published WAV containers (inline or as a download)
//! - playback: user transport commands and playback surface callbacks

pub mod handlers;
pub mod sse;

use crate::generation::GenerationOrchestrator;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub orchestrator: GenerationOrchestrator,
    /// Server port (reported by /health)
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Generation
                .route("/generate", post(handlers::generate))
                .route("/generation", get(handlers::get_generation))
                // Published audio
                .route("/audio/:resource_id", get(handlers::get_audio))
                .route("/audio/:resource_id/download", get(handlers::download_audio))
                // Transport commands
                .route("/playback/state", get(handlers::get_playback_state))
                .route("/playback/play", post(handlers::play))
                .route("/playback/pause", post(handlers::pause))
                .route("/playback/toggle", post(handlers::toggle))
                .route("/playback/seek", post(handlers::seek))
                // Playback surface callbacks
                .route("/surface/metadata", post(handlers::surface_metadata))
                .route("/surface/time", post(handlers::surface_time))
                .route("/surface/ended", post(handlers::surface_ended))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
