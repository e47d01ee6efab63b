use super::state::AppState;
use crate::error::{RecordingError, TranscriptionError};
use crate::pipeline::{DecisionError, DecisionOutcome};
use crate::presentation::PostRecordingDecision;
use crate::recording::{AudioArtifact, StartOutcome};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: PostRecordingDecision,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub status: String,
    pub artifact: AudioArtifact,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Text for the user-facing prompt
    pub message: String,
}

fn status(code: StatusCode, status: &str) -> Response {
    (
        code,
        Json(StatusResponse {
            status: status.to_string(),
        }),
    )
        .into_response()
}

fn error_response(code: StatusCode, error: String, message: String) -> Response {
    (code, Json(ErrorResponse { error, message })).into_response()
}

fn recording_error(err: RecordingError) -> Response {
    let code = match &err {
        RecordingError::PermissionDenied => StatusCode::FORBIDDEN,
        RecordingError::TooShort { .. } | RecordingError::EmptyOrCorrupt(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RecordingError::NotRecording => StatusCode::CONFLICT,
        RecordingError::AudioMode(_) | RecordingError::Backend(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(code, err.to_string(), err.user_message())
}

fn decision_error(err: DecisionError) -> Response {
    match err {
        DecisionError::Transcription(err) => {
            let code = match &err {
                TranscriptionError::TimedOut => StatusCode::GATEWAY_TIMEOUT,
                TranscriptionError::BackendUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                TranscriptionError::NoSpeechDetected => StatusCode::UNPROCESSABLE_ENTITY,
                TranscriptionError::Unknown(_) => StatusCode::BAD_GATEWAY,
            };
            error_response(code, err.to_string(), err.user_message())
        }
        DecisionError::Playback(err) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            err.to_string(),
            err.user_message(),
        ),
    }
}

/// POST /recording/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.chat.start_recording().await {
        Ok(StartOutcome::Started) => status(StatusCode::OK, "recording"),
        Ok(StartOutcome::AlreadyActive) => error_response(
            StatusCode::CONFLICT,
            "A recording is already in progress".to_string(),
            "Already recording.".to_string(),
        ),
        Ok(StartOutcome::Cancelled) => status(StatusCode::OK, "cancelled"),
        Err(e) => recording_error(e),
    }
}

/// POST /recording/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.chat.stop_recording().await {
        Ok(artifact) => {
            info!("Recording available at {}", artifact.uri().display());
            (
                StatusCode::OK,
                Json(StopRecordingResponse {
                    status: "ready".to_string(),
                    artifact,
                }),
            )
                .into_response()
        }
        Err(e) => recording_error(e),
    }
}

/// POST /recording/cancel
pub async fn cancel_recording(State(state): State<AppState>) -> Response {
    if state.chat.cancel_recording_ui().await {
        status(StatusCode::OK, "cancelled")
    } else {
        status(StatusCode::OK, "idle")
    }
}

/// POST /recording/acknowledge
pub async fn acknowledge_failure(State(state): State<AppState>) -> Response {
    if state.chat.acknowledge_failure().await {
        status(StatusCode::OK, "idle")
    } else {
        status(StatusCode::OK, "unchanged")
    }
}

/// GET /recording
pub async fn get_recording(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chat.recording_session().await)
}

/// POST /recording/decision
pub async fn decide(
    State(state): State<AppState>,
    Json(req): Json<DecisionRequest>,
) -> Response {
    match state.chat.decide(req.decision).await {
        Ok(DecisionOutcome::Playing(_)) => status(StatusCode::OK, "playing"),
        Ok(DecisionOutcome::Transcribed(text)) => (
            StatusCode::OK,
            Json(DecisionResponse {
                status: "transcribed".to_string(),
                text: Some(text),
            }),
        )
            .into_response(),
        Ok(DecisionOutcome::NotSent(text)) => (
            StatusCode::CONFLICT,
            Json(DecisionResponse {
                status: "not_sent".to_string(),
                text: Some(text),
            }),
        )
            .into_response(),
        Ok(DecisionOutcome::Discarded) => status(StatusCode::OK, "discarded"),
        Ok(DecisionOutcome::NoRecording) => error_response(
            StatusCode::NOT_FOUND,
            "No finished recording".to_string(),
            "There is no recording to use.".to_string(),
        ),
        Err(e) => {
            error!("Decision {:?} failed: {}", req.decision, e);
            decision_error(e)
        }
    }
}

/// POST /playback/stop
pub async fn stop_playback(State(state): State<AppState>) -> Response {
    state.chat.stop_playback().await;
    status(StatusCode::OK, "stopped")
}

/// POST /messages
/// Queue typed text; the reply arrives through the snapshot
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    if req.text.trim().is_empty() {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Message is empty".to_string(),
            "Please type a message.".to_string(),
        );
    }
    // Fire and forget; dispatch reports through the snapshot and notices
    drop(state.chat.send_typed(req.text));
    status(StatusCode::ACCEPTED, "queued")
}

/// GET /snapshot
pub async fn get_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chat.snapshot())
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
