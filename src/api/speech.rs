//! Batch speech endpoints: transcription, synthesis and the coaching demo

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State, multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ApiState, upload};
use crate::Error;

/// Largest audio upload accepted by `/api/transcribe`
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Build speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/api/transcribe",
            post(transcribe).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/text-to-speech", post(text_to_speech))
        .route("/api/learning-ai", post(learning_ai))
        .with_state(state)
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcript: Value,
}

/// Transcribe an uploaded audio file (multipart field `audio`)
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::warn!(error = %e, "transcription request is not multipart");
        ApiError::BadRequest("No audio file uploaded.".to_string())
    })?;
    let Some(upload) = upload::spool_field(&mut multipart, "audio").await? else {
        tracing::warn!("no audio file uploaded");
        return Err(ApiError::BadRequest("No audio file uploaded.".to_string()));
    };

    tracing::info!(size = upload.size(), "received audio upload");

    let result = state.speech.transcribe(&upload.audio()).await;
    upload.remove();

    let transcript = result.map_err(ApiError::vendor)?;
    Ok(Json(TranscribeResponse { transcript }))
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub target_language_code: Option<String>,
}

/// Synthesis response
#[derive(Debug, Serialize)]
pub struct SynthesizeResponse {
    pub audio: Value,
}

/// Synthesize text to speech
async fn text_to_speech(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> Result<Json<SynthesizeResponse>, ApiError> {
    let Json(request) = payload?;
    let (Some(text), Some(language)) = (
        non_empty(request.text),
        non_empty(request.target_language_code),
    ) else {
        return Err(ApiError::BadRequest(
            "text and target_language_code required".to_string(),
        ));
    };

    let audio = state
        .speech
        .synthesize(&text, &language)
        .await
        .map_err(ApiError::vendor)?;

    Ok(Json(SynthesizeResponse { audio }))
}

/// Coaching request
#[derive(Debug, Deserialize)]
pub struct CoachingRequest {
    #[serde(default)]
    pub transcript: Option<String>,
}

/// Coaching response: the reply text and its synthesized audio
#[derive(Debug, Serialize)]
pub struct CoachingResponse {
    pub answer: String,
    pub audio: Value,
}

/// Canned coaching reply to a learner's transcript
#[must_use]
pub fn coaching_reply(transcript: &str) -> String {
    format!(
        "You said: \"{transcript}\". That's an interesting point. When considering this, have you thought about the long-term implications?"
    )
}

/// Reply to a learner's transcript with canned coaching plus its audio
async fn learning_ai(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CoachingRequest>, JsonRejection>,
) -> Result<Json<CoachingResponse>, ApiError> {
    let Json(request) = payload?;
    let Some(transcript) = non_empty(request.transcript) else {
        return Err(ApiError::BadRequest("transcript is required".to_string()));
    };

    let answer = coaching_reply(&transcript);
    let audio = state
        .speech
        .synthesize(&answer, &state.coaching_language)
        .await
        .map_err(ApiError::vendor)?;

    Ok(Json(CoachingResponse { answer, audio }))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Speech API errors
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Vendor(String),
}

impl ApiError {
    fn vendor(error: Error) -> Self {
        tracing::error!(error = %error, "vendor call failed");
        match error {
            Error::Vendor(message) => Self::Vendor(message),
            other => Self::Vendor(other.to_string()),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        match error {
            Error::Upload(message) => Self::BadRequest(message),
            other => Self::Vendor(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Vendor(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coaching_reply_quotes_transcript() {
        assert_eq!(
            coaching_reply("school uniforms limit expression"),
            "You said: \"school uniforms limit expression\". That's an interesting point. When considering this, have you thought about the long-term implications?"
        );
    }

    #[test]
    fn upload_errors_are_bad_requests() {
        let err = ApiError::from(Error::Upload("unsupported audio type: text/plain".to_string()));
        assert!(matches!(err, ApiError::BadRequest(msg) if msg == "unsupported audio type: text/plain"));
    }

    #[test]
    fn blank_fields_count_as_missing() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(Some("hi".to_string())), Some("hi".to_string()));
    }
}
