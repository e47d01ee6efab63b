pub mod backend;
pub mod file;
pub mod mode;
pub mod recorder;
pub mod sources;

pub use backend::{AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};
pub use file::{probe_duration, AudioFile};
pub use mode::{AudioMode, AudioModeBackend, AudioSessionController, HeadlessAudioMode};
pub use recorder::{CaptureStatus, Recorder, WavRecorder};
pub use sources::{FileSource, ToneSource};
