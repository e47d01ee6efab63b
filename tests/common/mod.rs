// Test doubles for the pipeline's collaborators
//
// Each double records what was asked of it so tests can check side effects
// (release counts, audio mode changes, transport requests).

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, Notify};
use voicechat::audio::{AudioMode, AudioModeBackend, CaptureStatus, Recorder};
use voicechat::permission::{PermissionProvider, PermissionStatus};
use voicechat::playback::{PlaybackBackend, Sound};
use voicechat::pipeline::{Collaborators, PipelineOptions, VoiceChat};
use voicechat::transport::{
    AudioUpload, ChatReply, ChatRequest, ChatTransport, TranscriptionReply,
    TranscriptionTransport,
};
use voicechat::{AudioArtifact, TransportError};

// ============================================================================
// Recorder
// ============================================================================

#[derive(Default)]
pub struct RecorderProbe {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub releases: AtomicUsize,
    /// A capture is open and has not been stopped or released
    pub active: AtomicBool,
}

pub struct MockRecorder {
    pub dir: PathBuf,
    /// Bytes written to the file on stop (0 = no file)
    pub bytes: usize,
    pub was_recording: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub probe: Arc<RecorderProbe>,
}

impl MockRecorder {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            bytes: 4096,
            was_recording: true,
            fail_start: false,
            fail_stop: false,
            probe: Arc::new(RecorderProbe::default()),
        }
    }
}

#[async_trait::async_trait]
impl Recorder for MockRecorder {
    async fn start(&mut self) -> Result<()> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        if self.fail_start {
            bail!("microphone busy");
        }
        self.probe.active.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<CaptureStatus> {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            bail!("recorder crashed");
        }
        self.probe.active.store(false, Ordering::SeqCst);

        let path = if self.bytes > 0 {
            let n = self.probe.stops.load(Ordering::SeqCst);
            let path = self.dir.join(format!("mock-{}.m4a", n));
            std::fs::write(&path, vec![7u8; self.bytes])?;
            Some(path)
        } else {
            None
        };

        Ok(CaptureStatus {
            was_recording: self.was_recording,
            path,
        })
    }

    async fn release(&mut self) {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        self.probe.active.store(false, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Permission
// ============================================================================

pub struct MockPermission {
    pub granted: AtomicBool,
    pub requests: AtomicUsize,
    /// When set, each request waits for the next answer sent by the test
    gate: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<PermissionStatus>>>,
}

impl MockPermission {
    pub fn new(granted: bool) -> Arc<Self> {
        Arc::new(Self {
            granted: AtomicBool::new(granted),
            requests: AtomicUsize::new(0),
            gate: tokio::sync::Mutex::new(None),
        })
    }

    /// A provider that answers only when the test says so
    pub fn gated() -> (Arc<Self>, mpsc::UnboundedSender<PermissionStatus>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let permission = Arc::new(Self {
            granted: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
            gate: tokio::sync::Mutex::new(Some(rx)),
        });
        (permission, tx)
    }
}

#[async_trait::async_trait]
impl PermissionProvider for MockPermission {
    async fn request_microphone(&self) -> Result<PermissionStatus> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.lock().await;
        if let Some(answers) = gate.as_mut() {
            return Ok(answers.recv().await.unwrap_or(PermissionStatus::Denied));
        }
        if self.granted.load(Ordering::SeqCst) {
            Ok(PermissionStatus::Granted)
        } else {
            Ok(PermissionStatus::Denied)
        }
    }
}

// ============================================================================
// Audio mode
// ============================================================================

#[derive(Clone, Default)]
pub struct AudioModeLog(pub Arc<Mutex<Vec<AudioMode>>>);

impl AudioModeLog {
    pub fn modes(&self) -> Vec<AudioMode> {
        self.0.lock().unwrap().clone()
    }
}

pub struct RecordingAudioMode {
    pub log: AudioModeLog,
    pub fail_on: Option<AudioMode>,
}

impl RecordingAudioMode {
    pub fn new(log: AudioModeLog) -> Self {
        Self { log, fail_on: None }
    }
}

#[async_trait::async_trait]
impl AudioModeBackend for RecordingAudioMode {
    async fn configure(&self, mode: AudioMode) -> Result<()> {
        if self.fail_on == Some(mode) {
            bail!("audio focus unavailable");
        }
        self.log.0.lock().unwrap().push(mode);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording-log"
    }
}

// ============================================================================
// Playback
// ============================================================================

#[derive(Default)]
pub struct PlaybackProbe {
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
    /// Completion sender of the most recently played sound
    pub finish: Mutex<Option<oneshot::Sender<()>>>,
}

impl PlaybackProbe {
    /// Simulate the backend reaching the end of the sound
    pub fn complete(&self) {
        if let Some(tx) = self.finish.lock().unwrap().take() {
            let _ = tx.send(());
        }
    }
}

pub struct MockPlayback {
    pub probe: Arc<PlaybackProbe>,
    pub fail_load: bool,
}

impl MockPlayback {
    pub fn new() -> Self {
        Self {
            probe: Arc::new(PlaybackProbe::default()),
            fail_load: false,
        }
    }
}

#[async_trait::async_trait]
impl PlaybackBackend for MockPlayback {
    async fn load(&self, _artifact: &AudioArtifact) -> Result<Box<dyn Sound>> {
        if self.fail_load {
            bail!("unsupported format");
        }
        self.probe.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSound {
            probe: Arc::clone(&self.probe),
        }))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

struct MockSound {
    probe: Arc<PlaybackProbe>,
}

#[async_trait::async_trait]
impl Sound for MockSound {
    async fn play(&mut self) -> Result<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        *self.probe.finish.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn unload(&mut self) -> Result<()> {
        self.probe.unloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Transports
// ============================================================================

pub enum ChatBehavior {
    Reply(String),
    Fail,
    /// Wait for the notify before replying
    Gate(Arc<Notify>, String),
}

pub struct MockChat {
    pub behavior: ChatBehavior,
    pub requests: Mutex<Vec<ChatRequest>>,
}

impl MockChat {
    pub fn new(behavior: ChatBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(ChatBehavior::Reply(text.to_string()))
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChatTransport for MockChat {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            ChatBehavior::Reply(text) => Ok(ChatReply {
                response: text.clone(),
                thread_id: Some(request.thread_id.clone()),
            }),
            ChatBehavior::Fail => Err(TransportError::Network("connection refused".to_string())),
            ChatBehavior::Gate(gate, text) => {
                gate.notified().await;
                Ok(ChatReply {
                    response: text.clone(),
                    thread_id: None,
                })
            }
        }
    }
}

pub enum TranscriptionBehavior {
    Text(Option<String>),
    Error(TransportError),
    /// Never answers
    Hang,
}

pub struct MockTranscription {
    pub behavior: TranscriptionBehavior,
    pub uploads: Mutex<Vec<(String, String, usize)>>,
}

impl MockTranscription {
    pub fn new(behavior: TranscriptionBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            uploads: Mutex::new(Vec::new()),
        })
    }

    pub fn text(text: &str) -> Arc<Self> {
        Self::new(TranscriptionBehavior::Text(Some(text.to_string())))
    }
}

#[async_trait::async_trait]
impl TranscriptionTransport for MockTranscription {
    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionReply, TransportError> {
        self.uploads
            .lock()
            .unwrap()
            .push((upload.file_name, upload.mime_type, upload.bytes.len()));
        match &self.behavior {
            TranscriptionBehavior::Text(text) => Ok(TranscriptionReply { text: text.clone() }),
            TranscriptionBehavior::Error(e) => Err(e.clone()),
            TranscriptionBehavior::Hang => {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                Ok(TranscriptionReply::default())
            }
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

pub struct Harness {
    pub chat: VoiceChat,
    pub recorder: Arc<RecorderProbe>,
    pub permission: Arc<MockPermission>,
    pub audio_modes: AudioModeLog,
    pub playback: Arc<PlaybackProbe>,
    pub chat_transport: Arc<MockChat>,
    pub transcription: Arc<MockTranscription>,
}

pub struct HarnessBuilder {
    pub recorder: MockRecorder,
    pub permission: Arc<MockPermission>,
    pub chat: Arc<MockChat>,
    pub transcription: Arc<MockTranscription>,
    pub fail_playback_load: bool,
    pub fail_audio_mode: Option<AudioMode>,
    pub options: PipelineOptions,
}

impl HarnessBuilder {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            recorder: MockRecorder::new(dir),
            permission: MockPermission::new(true),
            chat: MockChat::replying("Sure, I can help with that."),
            transcription: MockTranscription::text("hello there"),
            fail_playback_load: false,
            fail_audio_mode: None,
            options: PipelineOptions::default(),
        }
    }

    pub fn build(self) -> Harness {
        let audio_modes = AudioModeLog::default();
        let mut playback = MockPlayback::new();
        playback.fail_load = self.fail_playback_load;
        let recorder_probe = Arc::clone(&self.recorder.probe);
        let playback_probe = Arc::clone(&playback.probe);

        let mut audio_mode = RecordingAudioMode::new(audio_modes.clone());
        audio_mode.fail_on = self.fail_audio_mode;

        let collaborators = Collaborators {
            recorder: Box::new(self.recorder),
            audio_mode: Box::new(audio_mode),
            permissions: self.permission.clone(),
            playback: Box::new(playback),
            chat: self.chat.clone(),
            transcription: self.transcription.clone(),
        };

        Harness {
            chat: VoiceChat::new(collaborators, self.options),
            recorder: recorder_probe,
            permission: self.permission,
            audio_modes,
            playback: playback_probe,
            chat_transport: self.chat,
            transcription: self.transcription,
        }
    }
}

/// Poll until `cond` holds; panics after about a second
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
