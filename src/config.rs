use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{AudioBackendConfig, AudioSource};
use crate::recording::RecordingConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub backend: BackendConfig,
    pub audio: AudioConfig,
    #[serde(default)]
    pub permission: PermissionConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Assistant backend
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_thread_id")]
    pub thread_id: String,
    #[serde(default = "default_transcription_timeout_secs")]
    pub transcription_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub recordings_path: String,
    #[serde(default)]
    pub source: AudioSource,
    pub sample_rate: u32,
    pub channels: u16,
    #[serde(default = "default_min_duration_ms")]
    pub min_duration_ms: u64,
    #[serde(default = "default_min_size_bytes")]
    pub min_size_bytes: u64,
}

#[derive(Debug, Deserialize)]
pub struct PermissionConfig {
    pub microphone: bool,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self { microphone: true }
    }
}

fn default_thread_id() -> String {
    "mobile_user".to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    30
}

fn default_min_duration_ms() -> u64 {
    1000
}

fn default_min_size_bytes() -> u64 {
    1024
}

impl Config {
    /// Load from a config file (extension optional), then `VOICECHAT__*` env vars
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICECHAT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

impl BackendConfig {
    pub fn transcription_timeout(&self) -> Duration {
        Duration::from_secs(self.transcription_timeout_secs)
    }
}

impl AudioConfig {
    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.recordings_path).into_owned())
    }

    pub fn backend_config(&self) -> AudioBackendConfig {
        AudioBackendConfig {
            target_sample_rate: self.sample_rate,
            target_channels: self.channels,
            ..AudioBackendConfig::default()
        }
    }

    pub fn recording_config(&self) -> RecordingConfig {
        RecordingConfig {
            min_duration: Duration::from_millis(self.min_duration_ms),
            min_size_bytes: self.min_size_bytes,
        }
    }
}
