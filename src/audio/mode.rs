// Audio session controller
//
// The platform audio session is configured for exactly one of recording or
// playback at a time. The controller tracks the mode it last applied and only
// touches the platform when the target differs.

use anyhow::Result;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::AudioModeError;

/// Platform audio session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioMode {
    Idle,
    Recording,
    Playback,
}

impl AudioMode {
    pub fn label(&self) -> &'static str {
        match self {
            AudioMode::Idle => "idle",
            AudioMode::Recording => "recording",
            AudioMode::Playback => "playback",
        }
    }
}

/// Applies an audio mode to the platform (audio category, focus, routing)
#[async_trait::async_trait]
pub trait AudioModeBackend: Send + Sync {
    async fn configure(&self, mode: AudioMode) -> Result<()>;

    fn name(&self) -> &str;
}

/// Backend for hosts with no platform audio session to configure
pub struct HeadlessAudioMode;

#[async_trait::async_trait]
impl AudioModeBackend for HeadlessAudioMode {
    async fn configure(&self, mode: AudioMode) -> Result<()> {
        debug!("Headless audio session now in {} mode", mode.label());
        Ok(())
    }

    fn name(&self) -> &str {
        "headless"
    }
}

pub struct AudioSessionController {
    backend: Box<dyn AudioModeBackend>,
    current: Mutex<AudioMode>,
}

impl AudioSessionController {
    pub fn new(backend: Box<dyn AudioModeBackend>) -> Self {
        info!("Audio session controller using {} backend", backend.name());
        Self {
            backend,
            current: Mutex::new(AudioMode::Idle),
        }
    }

    pub async fn enter_recording_mode(&self) -> Result<(), AudioModeError> {
        self.switch(AudioMode::Recording).await
    }

    pub async fn enter_playback_mode(&self) -> Result<(), AudioModeError> {
        self.switch(AudioMode::Playback).await
    }

    pub async fn exit_to_idle_mode(&self) -> Result<(), AudioModeError> {
        self.switch(AudioMode::Idle).await
    }

    pub async fn current_mode(&self) -> AudioMode {
        *self.current.lock().await
    }

    async fn switch(&self, target: AudioMode) -> Result<(), AudioModeError> {
        // Held across configure so concurrent switches apply in order
        let mut current = self.current.lock().await;
        if *current == target {
            debug!("Audio session already in {} mode", target.label());
            return Ok(());
        }

        self.backend
            .configure(target)
            .await
            .map_err(|e| AudioModeError {
                target: target.label(),
                reason: e.to_string(),
            })?;

        info!(
            "Audio session switched: {} -> {}",
            current.label(),
            target.label()
        );
        *current = target;
        Ok(())
    }
}
