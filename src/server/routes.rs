//! HTTP handlers.

use std::io::ErrorKind;
use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::error::ApiError;
use crate::engine::{DEFAULT_VOICE, Dispatcher, SynthesisResult};
use crate::storage::AudioStore;
use crate::voice::VoiceListing;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// Body of `POST /synthesize`.
#[derive(Debug, Deserialize)]
pub struct SynthesizeBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

/// Successful `POST /synthesize` response.
#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: SynthesisResult,
}

pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "local_engine": state.dispatcher.has_local_engine(),
    }))
}

pub async fn voices_handler(State(state): State<AppState>) -> Json<VoiceListing> {
    Json(state.dispatcher.list_voices().await)
}

pub async fn synthesize_handler(
    State(state): State<AppState>,
    body: Result<Json<SynthesizeBody>, JsonRejection>,
) -> Result<Json<SynthesizeResponse>, ApiError> {
    let Json(SynthesizeBody { text, voice }) = body?;
    let voice = voice
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VOICE.to_string());
    debug!(voice = %voice, chars = text.chars().count(), "synthesize request");

    // Run detached so a dropped connection cannot cancel synthesis halfway.
    let dispatcher = Arc::clone(&state.dispatcher);
    let result = tokio::spawn(async move { dispatcher.synthesize(&text, &voice).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(SynthesizeResponse {
        success: true,
        result,
    }))
}

pub async fn download_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_audio(&state, &filename, true).await
}

pub async fn audio_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    serve_audio(&state, &filename, false).await
}

async fn serve_audio(
    state: &AppState,
    filename: &str,
    attachment: bool,
) -> Result<Response, ApiError> {
    let path = state.dispatcher.store().resolve(filename).await?;

    let file = tokio::fs::File::open(&path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            ApiError::NotFound("File not found".to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));

    if attachment {
        let disposition = format!(
            "attachment; filename=\"{}\"",
            AudioStore::download_name()
        );
        let value = HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}
