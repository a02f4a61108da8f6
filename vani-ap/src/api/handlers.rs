//! HTTP request handlers
//!
//! Transport commands and surface callbacks all return the resulting
//! `PlaybackView`, so the caller can redraw without a second request.

use crate::api::AppContext;
use crate::audio::wav::{DOWNLOAD_FILENAME, MIME_TYPE};
use crate::audio::AudioContainer;
use crate::error::GenerationError;
use crate::generation::{GenerateOutcome, GenerationStatus};
use crate::playback::{PlaybackEvent, PlaybackView};
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
    port: u16,
    live_resources: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct MetadataRequest {
    duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
pub struct TimeUpdateRequest {
    position_seconds: f64,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "vani-ap".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("VANI_GIT_HASH").to_string(),
        build_timestamp: env!("VANI_BUILD_TIMESTAMP").to_string(),
        build_profile: env!("VANI_BUILD_PROFILE").to_string(),
        port: ctx.port,
        live_resources: ctx.state.store.len(),
    })
}

// ============================================================================
// Generation Endpoints
// ============================================================================

/// POST /generate - Turn text into a playable announcement
///
/// Responds with the generation status on success and `{ "error": ... }`
/// carrying the user-visible message otherwise.
pub async fn generate(
    State(ctx): State<AppContext>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerationStatus>, ApiError> {
    // Spawned: a client disconnect must not cancel a started request
    let orchestrator = ctx.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.generate(&req.text).await })
        .await
        .map_err(|e| {
            error!("Generation task failed: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Generation task failed")
        })?;

    match outcome {
        Ok(GenerateOutcome::Completed(resource)) => {
            info!("Announcement ready at {}", resource.url);
            Ok(Json(ctx.orchestrator.status().await))
        }
        Ok(GenerateOutcome::Superseded {
            request_id,
            latest_request_id,
        }) => Err(api_error(
            StatusCode::CONFLICT,
            format!(
                "Request {} was superseded by request {}",
                request_id, latest_request_id
            ),
        )),
        Err(e) => {
            let status = match &e {
                GenerationError::InvalidText(_) => StatusCode::BAD_REQUEST,
                GenerationError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            };
            Err(api_error(status, e.to_string()))
        }
    }
}

/// GET /generation - Current generation status
pub async fn get_generation(State(ctx): State<AppContext>) -> Json<GenerationStatus> {
    Json(ctx.orchestrator.status().await)
}

// ============================================================================
// Audio Endpoints
// ============================================================================

fn fetch_container(ctx: &AppContext, resource_id: Uuid) -> Result<AudioContainer, ApiError> {
    ctx.state.store.fetch(resource_id).ok_or_else(|| {
        warn!("Audio resource {} not found (released or unknown)", resource_id);
        api_error(
            StatusCode::NOT_FOUND,
            format!("Audio resource {} not found", resource_id),
        )
    })
}

/// Response body sharing the stored container buffer
fn shared_body(container: &AudioContainer) -> Body {
    Body::from(Bytes::from_owner(container.shared_bytes()))
}

/// GET /audio/:resource_id - Serve a published container for playback
pub async fn get_audio(
    State(ctx): State<AppContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let container = fetch_container(&ctx, resource_id)?;
    debug!("Serving {} bytes for {}", container.len(), resource_id);

    Ok((
        [(header::CONTENT_TYPE, MIME_TYPE)],
        shared_body(&container),
    )
        .into_response())
}

/// GET /audio/:resource_id/download - Same bytes as an attachment
pub async fn download_audio(
    State(ctx): State<AppContext>,
    Path(resource_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let container = fetch_container(&ctx, resource_id)?;
    let disposition = format!("attachment; filename=\"{}\"", DOWNLOAD_FILENAME);

    Ok((
        [
            (header::CONTENT_TYPE, MIME_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        shared_body(&container),
    )
        .into_response())
}

// ============================================================================
// Playback Endpoints
// ============================================================================

/// GET /playback/state - Player display state
pub async fn get_playback_state(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.state.playback_view().await)
}

/// POST /playback/play
pub async fn play(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.state.dispatch_playback(PlaybackEvent::Play).await)
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.state.dispatch_playback(PlaybackEvent::Pause).await)
}

/// POST /playback/toggle - Single play/pause button
pub async fn toggle(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.state.dispatch_playback(PlaybackEvent::TogglePlay).await)
}

/// POST /playback/seek - Move the playhead (clamped to the duration)
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> Json<PlaybackView> {
    Json(
        ctx.state
            .dispatch_playback(PlaybackEvent::Seek {
                target_seconds: req.position_seconds,
            })
            .await,
    )
}

// ============================================================================
// Playback Surface Callbacks
// ============================================================================

/// POST /surface/metadata - Surface loaded the media and knows its duration
pub async fn surface_metadata(
    State(ctx): State<AppContext>,
    Json(req): Json<MetadataRequest>,
) -> Json<PlaybackView> {
    Json(
        ctx.state
            .dispatch_playback(PlaybackEvent::MetadataLoaded {
                duration_seconds: req.duration_seconds,
            })
            .await,
    )
}

/// POST /surface/time - Surface playhead advanced
pub async fn surface_time(
    State(ctx): State<AppContext>,
    Json(req): Json<TimeUpdateRequest>,
) -> Json<PlaybackView> {
    Json(
        ctx.state
            .dispatch_playback(PlaybackEvent::Tick {
                position_seconds: req.position_seconds,
            })
            .await,
    )
}

/// POST /surface/ended - Surface reached the end of the media
pub async fn surface_ended(State(ctx): State<AppContext>) -> Json<PlaybackView> {
    Json(ctx.state.dispatch_playback(PlaybackEvent::Ended).await)
}
