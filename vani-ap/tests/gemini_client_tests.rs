//! Gemini client against a local stand-in for the speech service

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;
use vani_ap::generation::{GeminiConfig, GeminiSynthesizer, SpeechSynthesizer};
use vani_ap::GenerationError;

const TEST_KEY: &str = "test-key";

/// Replies according to the text it is asked to speak
async fn generate_content(
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(TEST_KEY) {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": { "code": 403, "message": "API key not valid." } })),
        );
    }
    assert!(call.ends_with(":generateContent"), "unexpected call {}", call);

    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    assert!(prompt.starts_with("Speaker Profile:"), "prompt without persona");
    let text = prompt.rsplit("Text to read:\n").next().unwrap_or_default();

    let reply = match text {
        "refuse" => json!({
            "candidates": [{ "content": { "parts": [{ "text": "I'd rather not." }] } }]
        }),
        "empty" => json!({ "candidates": [] }),
        _ => json!({
            "candidates": [{ "content": { "parts": [{ "inlineData": {
                "mimeType": "audio/L16;codec=pcm;rate=24000",
                "data": general_purpose::STANDARD.encode(vec![0u8; 4_800]),
            } }] } }]
        }),
    };
    (StatusCode::OK, Json(reply))
}

async fn spawn_service() -> String {
    let app = Router::new().route("/v1beta/models/:call", post(generate_content));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn synthesizer(base_url: String, api_key: &str) -> GeminiSynthesizer {
    GeminiSynthesizer::new(GeminiConfig {
        api_key: Some(api_key.to_string()),
        api_base_url: base_url,
        timeout: Duration::from_secs(5),
        ..GeminiConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_audio_reply_decodes_to_pcm() {
    let base_url = spawn_service().await;
    let pcm = synthesizer(base_url, TEST_KEY)
        .synthesize("Doors are closing.")
        .await
        .unwrap();

    assert_eq!(pcm.bytes.len(), 4_800);
    assert_eq!(pcm.format.sample_rate, 24_000);
    assert_eq!(pcm.frame_count(), 2_400);
}

#[tokio::test]
async fn test_text_reply_is_refusal() {
    let base_url = spawn_service().await;
    let err = synthesizer(base_url, TEST_KEY)
        .synthesize("refuse")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Model returned text instead of audio: I'd rather not.");
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let base_url = spawn_service().await;
    let err = synthesizer(base_url, TEST_KEY)
        .synthesize("empty")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::UpstreamEmptyResponse(_)));
}

#[tokio::test]
async fn test_error_status_surfaces_service_message() {
    let base_url = spawn_service().await;
    let err = synthesizer(base_url, "wrong-key")
        .synthesize("Hello")
        .await
        .unwrap_err();

    assert_eq!(err, GenerationError::Transport("API key not valid.".to_string()));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Bind then drop to get a port nothing listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = synthesizer(format!("http://{}", addr), TEST_KEY)
        .synthesize("Hello")
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Transport(_)));
}
