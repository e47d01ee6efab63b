use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

/// Why a recording session ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    PermissionDenied,
    EmptyOrCorrupt,
    AudioMode,
    Backend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "cause", rename_all = "snake_case")]
pub enum RecordingState {
    Idle,
    Requesting,
    Recording,
    Stopping,
    Validating,
    Failed(FailureCause),
}

impl RecordingState {
    /// States that own the microphone; a new recording cannot start in these
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RecordingState::Requesting
                | RecordingState::Recording
                | RecordingState::Stopping
                | RecordingState::Validating
        )
    }
}

/// A validated recording on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    uri: PathBuf,
    size_bytes: u64,
}

impl AudioArtifact {
    pub(crate) fn new(uri: PathBuf, size_bytes: u64) -> Self {
        Self { uri, size_bytes }
    }

    pub fn uri(&self) -> &Path {
        &self.uri
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// The one recording session
///
/// Each transition consumes the session and returns its successor; the
/// manager decides which transitions are legal.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingSession {
    pub id: Uuid,
    pub state: RecordingState,
    pub started_at: Option<DateTime<Utc>>,
    pub artifact: Option<AudioArtifact>,
    /// Cancel arrived while permission was pending; the session stays
    /// `Requesting` until the pending start has torn down
    pub cancel_requested: bool,
    #[serde(skip)]
    started_instant: Option<Instant>,
}

impl RecordingSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RecordingState::Idle,
            started_at: None,
            artifact: None,
            cancel_requested: false,
            started_instant: None,
        }
    }

    /// Time spent in `Recording` so far
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        self.started_instant
            .map(|started| now.saturating_duration_since(started))
    }

    pub(crate) fn requesting(self) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RecordingState::Requesting,
            ..Self::new()
        }
    }

    pub(crate) fn cancelling(self) -> Self {
        Self {
            cancel_requested: true,
            ..self
        }
    }

    pub(crate) fn recording(self, now: Instant) -> Self {
        Self {
            state: RecordingState::Recording,
            started_at: Some(Utc::now()),
            started_instant: Some(now),
            ..self
        }
    }

    pub(crate) fn stopping(self) -> Self {
        Self {
            state: RecordingState::Stopping,
            ..self
        }
    }

    pub(crate) fn validating(self) -> Self {
        Self {
            state: RecordingState::Validating,
            ..self
        }
    }

    pub(crate) fn completed(self, artifact: AudioArtifact) -> Self {
        Self {
            state: RecordingState::Idle,
            artifact: Some(artifact),
            ..self
        }
    }

    pub(crate) fn failed(self, cause: FailureCause) -> Self {
        Self {
            state: RecordingState::Failed(cause),
            artifact: None,
            ..self
        }
    }

    /// Back to `Idle` with nothing to hand on (acknowledge, cancel, discard)
    pub(crate) fn reset(self) -> Self {
        Self {
            state: RecordingState::Idle,
            artifact: None,
            cancel_requested: false,
            started_instant: None,
            ..self
        }
    }
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}
