//! Voice chat facade
//!
//! Wires the recording, playback, transcription and dispatch components
//! together and exposes the commands the presentation layer issues.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::audio::{
    AudioBackendFactory, AudioModeBackend, AudioSessionController, HeadlessAudioMode, Recorder,
    WavRecorder,
};
use crate::chat::{DispatchOutcome, Message, MessageDispatch};
use crate::config::Config;
use crate::error::{PlaybackError, RecordingError, TranscriptionError};
use crate::permission::{PermissionProvider, StaticPermission};
use crate::playback::{HeadlessPlayback, PlaybackBackend, PlaybackHandle, PlaybackManager};
use crate::presentation::{Notice, PostRecordingDecision, Presenter, Snapshot};
use crate::recording::{
    AudioArtifact, RecordingConfig, RecordingManager, RecordingSession, StartOutcome,
};
use crate::transcription::{TranscriptionOrchestrator, DEFAULT_TRANSCRIPTION_TIMEOUT};
use crate::transport::{
    ChatTransport, HttpChatTransport, HttpTranscriptionTransport, TranscriptionTransport,
};

/// Result of acting on a [`PostRecordingDecision`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    Playing(PlaybackHandle),
    Transcribed(String),
    /// Transcribed, but another message was in flight; the recording is kept
    NotSent(String),
    Discarded,
    /// There was no finished recording to act on
    NoRecording,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
}

/// Every collaborator the pipeline needs
pub struct Collaborators {
    pub recorder: Box<dyn Recorder>,
    pub audio_mode: Box<dyn AudioModeBackend>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub playback: Box<dyn PlaybackBackend>,
    pub chat: Arc<dyn ChatTransport>,
    pub transcription: Arc<dyn TranscriptionTransport>,
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub thread_id: String,
    pub recording: RecordingConfig,
    pub transcription_timeout: std::time::Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            thread_id: "mobile_user".to_string(),
            recording: RecordingConfig::default(),
            transcription_timeout: DEFAULT_TRANSCRIPTION_TIMEOUT,
        }
    }
}

pub struct VoiceChat {
    presenter: Arc<Presenter>,
    recording: RecordingManager,
    playback: Arc<PlaybackManager>,
    transcription: TranscriptionOrchestrator,
    dispatch: Arc<MessageDispatch>,
}

impl VoiceChat {
    pub fn new(collaborators: Collaborators, options: PipelineOptions) -> Self {
        let presenter = Arc::new(Presenter::new());
        let audio = Arc::new(AudioSessionController::new(collaborators.audio_mode));

        let dispatch = Arc::new(MessageDispatch::new(
            collaborators.chat,
            options.thread_id,
            Arc::clone(&presenter),
        ));
        let recording = RecordingManager::new(
            collaborators.recorder,
            collaborators.permissions,
            Arc::clone(&audio),
            Arc::clone(&presenter),
            options.recording,
        );
        let playback = PlaybackManager::new(
            collaborators.playback,
            Arc::clone(&audio),
            Arc::clone(&presenter),
        );
        let transcription = TranscriptionOrchestrator::new(
            collaborators.transcription,
            Arc::clone(&dispatch),
            Arc::clone(&presenter),
            options.transcription_timeout,
        );

        Self {
            presenter,
            recording,
            playback,
            transcription,
            dispatch,
        }
    }

    /// Build the pipeline from configuration with the headless backends
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let source =
            AudioBackendFactory::create(cfg.audio.source.clone(), cfg.audio.backend_config())?;
        let recorder = WavRecorder::new(source, cfg.audio.recordings_dir())?;

        let collaborators = Collaborators {
            recorder: Box::new(recorder),
            audio_mode: Box::new(HeadlessAudioMode),
            permissions: Arc::new(StaticPermission::new(cfg.permission.microphone)),
            playback: Box::new(HeadlessPlayback),
            chat: Arc::new(HttpChatTransport::new(&cfg.backend.base_url)?),
            transcription: Arc::new(HttpTranscriptionTransport::new(
                &cfg.backend.base_url,
                cfg.backend.transcription_timeout(),
            )?),
        };

        let options = PipelineOptions {
            thread_id: cfg.backend.thread_id.clone(),
            recording: cfg.audio.recording_config(),
            transcription_timeout: cfg.backend.transcription_timeout(),
        };

        info!(
            "Voice chat pipeline configured for {} (thread {})",
            cfg.backend.base_url, options.thread_id
        );
        Ok(Self::new(collaborators, options))
    }

    pub fn snapshot(&self) -> Snapshot {
        self.presenter.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.presenter.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.presenter.notices()
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.dispatch.messages().await
    }

    pub async fn recording_session(&self) -> RecordingSession {
        self.recording.session().await
    }

    pub async fn start_recording(&self) -> Result<StartOutcome, RecordingError> {
        // Recording and playback modes never overlap
        self.playback.stop_active().await;
        self.recording.start().await
    }

    pub async fn stop_recording(&self) -> Result<AudioArtifact, RecordingError> {
        self.recording.stop().await
    }

    pub async fn cancel_recording_ui(&self) -> bool {
        self.recording.cancel().await
    }

    pub async fn acknowledge_failure(&self) -> bool {
        self.recording.acknowledge().await
    }

    /// Queue typed text for sending; returns once the send has been handed off
    pub fn send_typed(&self, text: impl Into<String>) -> JoinHandle<DispatchOutcome> {
        let dispatch = Arc::clone(&self.dispatch);
        let text = text.into();
        tokio::spawn(async move { dispatch.send(&text).await })
    }

    /// Act on the user's choice for the last finished recording
    pub async fn decide(
        &self,
        decision: PostRecordingDecision,
    ) -> Result<DecisionOutcome, DecisionError> {
        let Some(artifact) = self.recording.artifact().await else {
            warn!("No finished recording for {:?}", decision);
            return Ok(DecisionOutcome::NoRecording);
        };

        match decision {
            PostRecordingDecision::Play => {
                let handle = self.playback.play(&artifact).await?;
                Ok(DecisionOutcome::Playing(handle))
            }
            PostRecordingDecision::Transcribe => {
                self.playback.stop_active().await;
                let transcript = self.transcription.transcribe(&artifact).await?;
                if !transcript.reached_conversation() {
                    return Ok(DecisionOutcome::NotSent(transcript.text));
                }
                // The recording has served its purpose once its text is in the chat
                self.recording.discard_artifact().await;
                Ok(DecisionOutcome::Transcribed(transcript.text))
            }
            PostRecordingDecision::Discard => {
                self.playback.stop_active().await;
                self.recording.discard_artifact().await;
                Ok(DecisionOutcome::Discarded)
            }
        }
    }

    pub async fn stop_playback(&self) {
        self.playback.stop_active().await;
    }
}
