// Frame sources for hosts without a platform microphone
//
// Both sources pace their frames in real time so a recording made from them
// has the same timing as one made from a microphone.

use anyhow::{bail, Result};
use std::f32::consts::PI;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};
use super::file::AudioFile;

/// Sine tone generator
pub struct ToneSource {
    config: AudioBackendConfig,
    frequency_hz: f32,
    task: Option<JoinHandle<()>>,
}

impl ToneSource {
    pub fn new(config: AudioBackendConfig, frequency_hz: f32) -> Self {
        Self {
            config,
            frequency_hz,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for ToneSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(100);
        let config = self.config.clone();
        let frequency_hz = self.frequency_hz;

        info!(
            "Tone source started ({:.0}Hz tone, {}Hz, {} channels)",
            frequency_hz, config.target_sample_rate, config.target_channels
        );

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval(Duration::from_millis(config.buffer_duration_ms));
            let samples_per_frame = config.samples_per_frame();
            let channels = config.target_channels.max(1) as usize;
            let mut frame_index: u64 = 0;
            let mut phase: usize = 0;

            loop {
                ticker.tick().await;

                let mut samples = Vec::with_capacity(samples_per_frame);
                for _ in 0..samples_per_frame / channels {
                    let t = phase as f32 / config.target_sample_rate as f32;
                    let value = (2.0 * PI * frequency_hz * t).sin() * 0.3 * i16::MAX as f32;
                    for _ in 0..channels {
                        samples.push(value as i16);
                    }
                    phase += 1;
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate: config.target_sample_rate,
                    channels: config.target_channels,
                    timestamp_ms: frame_index * config.buffer_duration_ms,
                };

                if tx.send(frame).await.is_err() {
                    debug!("Tone receiver dropped");
                    break;
                }
                frame_index += 1;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            // Aborting drops the sender, which closes the frame channel
            task.abort();
            info!("Tone source stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "tone"
    }
}

/// Replays a WAV file as if it were being captured live
pub struct FileSource {
    config: AudioBackendConfig,
    path: PathBuf,
    task: Option<JoinHandle<()>>,
}

impl FileSource {
    pub fn new(config: AudioBackendConfig, path: PathBuf) -> Result<Self> {
        if !path.exists() {
            bail!("Audio source file not found: {}", path.display());
        }
        Ok(Self {
            config,
            path,
            task: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.task.is_some() {
            bail!("Already capturing");
        }

        let audio = AudioFile::open(&self.path)?;
        let (tx, rx) = mpsc::channel(100);
        let buffer_ms = self.config.buffer_duration_ms.max(1);

        self.task = Some(tokio::spawn(async move {
            let chunk_len = (audio.sample_rate as u64 * audio.channels as u64 * buffer_ms / 1000)
                .max(1) as usize;
            let mut ticker = interval(Duration::from_millis(buffer_ms));

            for (index, chunk) in audio.samples.chunks(chunk_len).enumerate() {
                ticker.tick().await;
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: audio.sample_rate,
                    channels: audio.channels,
                    timestamp_ms: index as u64 * buffer_ms,
                };
                if tx.send(frame).await.is_err() {
                    break;
                }
            }

            debug!("File source reached end of {}", audio.path);
            // Hold the channel open until stopped, like a silent microphone
            std::future::pending::<()>().await;
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("File source stopped: {}", self.path.display());
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.is_some()
    }

    fn name(&self) -> &str {
        "file"
    }
}
