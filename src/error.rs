//! Error taxonomy for the voice-to-chat pipeline
//!
//! Backends (capture sources, playback, platform audio session) report
//! `anyhow::Error`. The managers convert those into the typed errors below,
//! which is what the presentation layer sees.

use thiserror::Error;

/// Audio session could not be switched to the requested mode
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to switch audio mode to {target}: {reason}")]
pub struct AudioModeError {
    pub target: &'static str,
    pub reason: String,
}

/// Recording lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordingError {
    /// Microphone permission was denied for this attempt
    #[error("Microphone permission denied")]
    PermissionDenied,

    /// Stop requested before the minimum duration elapsed; capture continues
    #[error("Recording too short: {elapsed_ms}ms (minimum {min_ms}ms)")]
    TooShort { elapsed_ms: u64, min_ms: u64 },

    /// Capture finished but produced no usable audio
    #[error("Recording empty or corrupt: {0}")]
    EmptyOrCorrupt(String),

    /// Stop issued while no recording is in progress
    #[error("No recording in progress")]
    NotRecording,

    #[error(transparent)]
    AudioMode(#[from] AudioModeError),

    /// Unexpected capture backend failure
    #[error("Recording backend error: {0}")]
    Backend(String),
}

impl RecordingError {
    /// Message suitable for a modal prompt
    pub fn user_message(&self) -> String {
        match self {
            RecordingError::PermissionDenied => {
                "Microphone access is required to record. Please allow it in settings.".to_string()
            }
            RecordingError::TooShort { .. } => {
                "Please hold on a little longer. Recordings must be at least one second.".to_string()
            }
            RecordingError::EmptyOrCorrupt(_) => {
                "The recording was empty. Please try again.".to_string()
            }
            RecordingError::NotRecording => "Nothing is being recorded.".to_string(),
            RecordingError::AudioMode(_) => {
                "Could not access the audio device. Please try again.".to_string()
            }
            RecordingError::Backend(_) => "Recording failed. Please try again.".to_string(),
        }
    }
}

/// Transcription failures, classified for the user
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("Transcription timed out")]
    TimedOut,

    /// The transcription endpoint does not exist on the backend
    #[error("Transcription backend unavailable")]
    BackendUnavailable,

    #[error("No speech detected")]
    NoSpeechDetected,

    #[error("Transcription failed: {0}")]
    Unknown(String),
}

impl TranscriptionError {
    pub fn user_message(&self) -> String {
        match self {
            TranscriptionError::TimedOut => {
                "Transcription took too long. Please try a shorter recording.".to_string()
            }
            TranscriptionError::BackendUnavailable => {
                "Voice transcription is not available on the server right now.".to_string()
            }
            TranscriptionError::NoSpeechDetected => {
                "No speech was detected. Please try again.".to_string()
            }
            TranscriptionError::Unknown(_) => {
                "Could not transcribe the recording. Please try again.".to_string()
            }
        }
    }
}

/// Chat transport failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not reach the assistant: {0}")]
pub struct ConnectivityError(pub String);

impl ConnectivityError {
    pub fn user_message(&self) -> String {
        "Unable to connect to the server. Please check your connection.".to_string()
    }
}

/// Playback failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error(transparent)]
    AudioMode(#[from] AudioModeError),

    #[error("Failed to load recording: {0}")]
    Load(String),

    #[error("Failed to start playback: {0}")]
    Start(String),
}

impl PlaybackError {
    pub fn user_message(&self) -> String {
        "Could not play the recording.".to_string()
    }
}

/// Errors reported by transport implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Endpoint does not exist (HTTP 404)
    #[error("Endpoint not found")]
    NotFound,

    #[error("Request timed out")]
    Timeout,

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),
}
