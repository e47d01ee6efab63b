use std::fs;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::state::{AudioArtifact, FailureCause, RecordingSession, RecordingState};
use crate::audio::{AudioSessionController, CaptureStatus, Recorder};
use crate::error::RecordingError;
use crate::permission::{PermissionProvider, PermissionStatus};
use crate::presentation::{Notice, Presenter};

/// Validation thresholds for a finished recording
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Stop requests before this much capture time are rejected
    pub min_duration: Duration,
    /// Smallest file accepted as containing audio
    pub min_size_bytes: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            min_duration: Duration::from_millis(1000),
            min_size_bytes: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    /// Another recording owns the microphone; nothing changed
    AlreadyActive,
    /// The attempt was cancelled while waiting for permission
    Cancelled,
}

/// Recording lifecycle manager
///
/// Owns the single [`RecordingSession`] and the recorder. Every path into
/// `Failed` or back to `Idle` without an artifact releases the recorder and
/// resets the audio session first.
pub struct RecordingManager {
    session: Mutex<RecordingSession>,
    recorder: Mutex<Box<dyn Recorder>>,
    permissions: Arc<dyn PermissionProvider>,
    audio: Arc<AudioSessionController>,
    presenter: Arc<Presenter>,
    config: RecordingConfig,
}

impl RecordingManager {
    pub fn new(
        recorder: Box<dyn Recorder>,
        permissions: Arc<dyn PermissionProvider>,
        audio: Arc<AudioSessionController>,
        presenter: Arc<Presenter>,
        config: RecordingConfig,
    ) -> Self {
        info!(
            "Recording manager ready ({} recorder, min {}ms / {} bytes)",
            recorder.name(),
            config.min_duration.as_millis(),
            config.min_size_bytes
        );

        Self {
            session: Mutex::new(RecordingSession::new()),
            recorder: Mutex::new(recorder),
            permissions,
            audio,
            presenter,
            config,
        }
    }

    /// Current session, by value
    pub async fn session(&self) -> RecordingSession {
        self.session.lock().await.clone()
    }

    pub async fn state(&self) -> RecordingState {
        self.session.lock().await.state
    }

    /// Artifact from the last successful recording, if not yet consumed
    pub async fn artifact(&self) -> Option<AudioArtifact> {
        self.session.lock().await.artifact.clone()
    }

    /// Idle → Requesting → Recording
    pub async fn start(&self) -> Result<StartOutcome, RecordingError> {
        let (id, previous) = {
            let mut session = self.session.lock().await;
            if session.state.is_active() {
                warn!(
                    "Ignoring start: recording {} is {:?}",
                    session.id, session.state
                );
                return Ok(StartOutcome::AlreadyActive);
            }
            if let RecordingState::Failed(cause) = session.state {
                info!("Resetting failed recording ({:?}) before new attempt", cause);
            }

            let previous = session.artifact.take();
            self.advance(&mut session, RecordingSession::requesting);
            (session.id, previous)
        };

        if let Some(artifact) = previous {
            info!("Discarding unused recording {}", artifact.uri().display());
            remove_file(artifact.uri());
        }

        info!("Requesting microphone permission for recording {}", id);
        let permission = self.permissions.request_microphone().await;
        if self.cancel_pending(id).await {
            return Ok(self.finish_cancelled(id).await);
        }
        match permission {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                return Err(self
                    .fail(id, FailureCause::PermissionDenied, RecordingError::PermissionDenied)
                    .await);
            }
            Err(e) => {
                return Err(self
                    .fail(
                        id,
                        FailureCause::Backend,
                        RecordingError::Backend(format!("Permission query failed: {:#}", e)),
                    )
                    .await);
            }
        }

        if let Err(e) = self.audio.enter_recording_mode().await {
            if self.cancel_pending(id).await {
                return Ok(self.finish_cancelled(id).await);
            }
            return Err(self.fail(id, FailureCause::AudioMode, e.into()).await);
        }

        let started = {
            let mut recorder = self.recorder.lock().await;
            recorder.start().await
        };
        if let Err(e) = started {
            error!("Failed to start recording {}: {:#}", id, e);
            if self.cancel_pending(id).await {
                return Ok(self.finish_cancelled(id).await);
            }
            return Err(self
                .fail(id, FailureCause::Backend, RecordingError::Backend(format!("{:#}", e)))
                .await);
        }

        {
            let mut session = self.session.lock().await;
            if session.id == id
                && session.state == RecordingState::Requesting
                && !session.cancel_requested
            {
                self.advance(&mut session, |s| s.recording(Instant::now()));
                info!("Recording {} started", id);
                return Ok(StartOutcome::Started);
            }
        }

        Ok(self.finish_cancelled(id).await)
    }

    /// Recording → Stopping → Validating → Idle (with artifact)
    pub async fn stop(&self) -> Result<AudioArtifact, RecordingError> {
        let now = Instant::now();
        let id = {
            let mut session = self.session.lock().await;
            if session.state != RecordingState::Recording {
                warn!("Ignoring stop: recording is {:?}", session.state);
                return Err(RecordingError::NotRecording);
            }

            let elapsed = session.elapsed(now).unwrap_or_default();
            if elapsed < self.config.min_duration {
                let err = RecordingError::TooShort {
                    elapsed_ms: elapsed.as_millis() as u64,
                    min_ms: self.config.min_duration.as_millis() as u64,
                };
                warn!("Rejecting stop for recording {}: {}", session.id, err);
                self.presenter.notify(Notice::TooShort {
                    message: err.user_message(),
                });
                return Err(err);
            }

            self.advance(&mut session, RecordingSession::stopping);
            session.id
        };

        let stopped = {
            let mut recorder = self.recorder.lock().await;
            recorder.stop().await
        };
        let status = match stopped {
            Ok(status) => status,
            Err(e) => {
                error!("Failed to stop recording {}: {:#}", id, e);
                return Err(self
                    .fail(id, FailureCause::Backend, RecordingError::Backend(format!("{:#}", e)))
                    .await);
            }
        };

        {
            let mut session = self.session.lock().await;
            self.advance(&mut session, RecordingSession::validating);
        }

        let artifact = match self.validate(&status) {
            Ok(artifact) => artifact,
            Err(reason) => {
                warn!("Recording {} rejected: {}", id, reason);
                if let Some(path) = &status.path {
                    remove_file(path);
                }
                return Err(self
                    .fail(
                        id,
                        FailureCause::EmptyOrCorrupt,
                        RecordingError::EmptyOrCorrupt(reason),
                    )
                    .await);
            }
        };

        if let Err(e) = self.audio.exit_to_idle_mode().await {
            remove_file(artifact.uri());
            return Err(self.fail(id, FailureCause::AudioMode, e.into()).await);
        }

        {
            let mut session = self.session.lock().await;
            self.advance(&mut session, |s| s.completed(artifact.clone()));
        }

        info!(
            "Recording {} ready: {} ({} bytes)",
            id,
            artifact.uri().display(),
            artifact.size_bytes()
        );
        self.presenter.notify(Notice::ArtifactReady {
            artifact: artifact.clone(),
        });

        Ok(artifact)
    }

    /// Abandon an in-progress recording without validating it
    ///
    /// Goes through the same teardown as a backend failure and ends in `Idle`.
    /// Returns whether anything was cancelled.
    pub async fn cancel(&self) -> bool {
        let id = {
            let mut session = self.session.lock().await;
            match session.state {
                RecordingState::Requesting => {
                    // The pending start() tears down and resets once it resumes
                    if !session.cancel_requested {
                        info!("Cancelling recording {} during permission request", session.id);
                        self.advance(&mut session, RecordingSession::cancelling);
                    }
                    return true;
                }
                RecordingState::Recording => {
                    self.advance(&mut session, RecordingSession::stopping);
                    session.id
                }
                state => {
                    info!("Nothing to cancel: recording is {:?}", state);
                    return false;
                }
            }
        };

        info!("Cancelling recording {}", id);
        self.teardown().await;

        let mut session = self.session.lock().await;
        self.advance(&mut session, RecordingSession::reset);
        true
    }

    /// Failed → Idle
    pub async fn acknowledge(&self) -> bool {
        let mut session = self.session.lock().await;
        match session.state {
            RecordingState::Failed(cause) => {
                info!("Recording failure acknowledged ({:?})", cause);
                self.advance(&mut session, RecordingSession::reset);
                true
            }
            _ => false,
        }
    }

    /// Hand the finished recording to its consumer, leaving the file in place
    pub async fn take_artifact(&self) -> Option<AudioArtifact> {
        let mut session = self.session.lock().await;
        if session.state != RecordingState::Idle {
            return None;
        }
        session.artifact.take()
    }

    /// Drop the finished recording and delete its file
    pub async fn discard_artifact(&self) -> bool {
        match self.take_artifact().await {
            Some(artifact) => {
                info!("Discarding recording {}", artifact.uri().display());
                remove_file(artifact.uri());
                true
            }
            None => false,
        }
    }

    fn validate(&self, status: &CaptureStatus) -> Result<AudioArtifact, String> {
        if !status.was_recording {
            return Err("recorder was not capturing".to_string());
        }
        let path = status
            .path
            .as_ref()
            .ok_or_else(|| "no audio was written".to_string())?;
        let size_bytes = fs::metadata(path)
            .map_err(|e| format!("recording file missing: {}", e))?
            .len();
        if size_bytes < self.config.min_size_bytes {
            return Err(format!(
                "recording is {} bytes (minimum {})",
                size_bytes, self.config.min_size_bytes
            ));
        }
        Ok(AudioArtifact::new(path.clone(), size_bytes))
    }

    /// Release the recorder and reset the audio session
    async fn teardown(&self) {
        {
            let mut recorder = self.recorder.lock().await;
            recorder.release().await;
        }
        if let Err(e) = self.audio.exit_to_idle_mode().await {
            error!("Failed to reset audio session after recording: {}", e);
        }
    }

    /// Whether the attempt `id` was cancelled (or replaced) while awaiting
    async fn cancel_pending(&self, id: Uuid) -> bool {
        let session = self.session.lock().await;
        session.id != id || session.cancel_requested
    }

    /// Tear down a start that was cancelled during its permission request
    async fn finish_cancelled(&self, id: Uuid) -> StartOutcome {
        info!("Recording {} was cancelled during permission request", id);
        if !self.owns_session(id).await {
            return StartOutcome::Cancelled;
        }
        self.teardown().await;

        let mut session = self.session.lock().await;
        if session.id == id {
            self.advance(&mut session, RecordingSession::reset);
        }
        StartOutcome::Cancelled
    }

    /// Session `id` is still current; the active state keeps any other
    /// attempt from starting until it settles
    async fn owns_session(&self, id: Uuid) -> bool {
        let session = self.session.lock().await;
        if session.id != id {
            warn!("Recording {} superseded by {}; leaving it alone", id, session.id);
            return false;
        }
        true
    }

    /// Tear down, move session `id` to `Failed(cause)` and tell the user
    async fn fail(&self, id: Uuid, cause: FailureCause, err: RecordingError) -> RecordingError {
        error!("Recording {} failed: {}", id, err);
        if !self.owns_session(id).await {
            return err;
        }
        self.teardown().await;

        {
            let mut session = self.session.lock().await;
            if session.id == id {
                self.advance(&mut session, |s| s.failed(cause));
            }
        }

        let message = err.user_message();
        self.presenter.notify(match cause {
            FailureCause::PermissionDenied => Notice::PermissionDenied { message },
            _ => Notice::RecordingFailed { message },
        });
        err
    }

    fn advance(
        &self,
        session: &mut RecordingSession,
        transition: impl FnOnce(RecordingSession) -> RecordingSession,
    ) {
        let current = std::mem::take(session);
        let from = current.state;
        *session = transition(current);
        if from != session.state {
            info!("Recording {}: {:?} -> {:?}", session.id, from, session.state);
        }
        self.presenter
            .set_recording(session.state == RecordingState::Recording);
    }
}

fn remove_file(path: &std::path::Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove recording {}: {}", path.display(), e);
        }
    }
}
