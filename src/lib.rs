pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod permission;
pub mod pipeline;
pub mod playback;
pub mod presentation;
pub mod recording;
pub mod transcription;
pub mod transport;

pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioMode,
    AudioModeBackend, AudioSessionController, AudioSource, CaptureStatus, Recorder, WavRecorder,
};
pub use chat::{DispatchOutcome, Message, MessageDispatch, Sender};
pub use config::Config;
pub use error::{
    AudioModeError, ConnectivityError, PlaybackError, RecordingError, TranscriptionError,
    TransportError,
};
pub use http::{create_router, AppState};
pub use permission::{PermissionProvider, PermissionStatus, StaticPermission};
pub use pipeline::{Collaborators, DecisionOutcome, PipelineOptions, VoiceChat};
pub use playback::{PlaybackBackend, PlaybackHandle, PlaybackManager, Sound};
pub use presentation::{LoadingGuard, Notice, PostRecordingDecision, Presenter, Snapshot};
pub use recording::{
    AudioArtifact, FailureCause, RecordingConfig, RecordingManager, RecordingSession,
    RecordingState, StartOutcome,
};
pub use transcription::{Transcript, TranscriptionOrchestrator};
