use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{AudioBackend, AudioFrame};

/// What the capture backend reports when a recording is stopped
#[derive(Debug, Clone)]
pub struct CaptureStatus {
    /// Whether the backend was actively capturing when stop was issued
    pub was_recording: bool,
    /// Where the captured audio was written, if anything was written
    pub path: Option<PathBuf>,
}

/// Recording handle used by the recording lifecycle manager
///
/// A recorder owns at most one in-progress capture. `release` must be safe to
/// call at any point, any number of times, and must leave no capture running.
#[async_trait::async_trait]
pub trait Recorder: Send {
    /// Begin capturing to a new file
    async fn start(&mut self) -> Result<()>;

    /// Stop the current capture and finalize its file
    async fn stop(&mut self) -> Result<CaptureStatus>;

    /// Tear down any in-progress capture and delete its partial file
    async fn release(&mut self);

    /// Get recorder name for logging
    fn name(&self) -> &str;
}

struct ActiveCapture {
    path: PathBuf,
    writer: JoinHandle<Result<usize>>,
}

/// Records frames from an [`AudioBackend`] into WAV files
pub struct WavRecorder {
    source: Box<dyn AudioBackend>,
    output_dir: PathBuf,
    active: Option<ActiveCapture>,
}

impl WavRecorder {
    pub fn new(source: Box<dyn AudioBackend>, output_dir: PathBuf) -> Result<Self> {
        // Create output directory if it doesn't exist
        fs::create_dir_all(&output_dir).context("Failed to create recordings directory")?;

        info!(
            "WAV recorder initialized: {} -> {}",
            source.name(),
            output_dir.display()
        );

        Ok(Self {
            source,
            output_dir,
            active: None,
        })
    }
}

#[async_trait::async_trait]
impl Recorder for WavRecorder {
    async fn start(&mut self) -> Result<()> {
        if self.active.is_some() {
            bail!("Already recording");
        }

        let path = self
            .output_dir
            .join(format!("recording-{}.wav", uuid::Uuid::new_v4()));

        let frames = self
            .source
            .start()
            .await
            .context("Failed to start audio capture")?;

        let writer = tokio::spawn(write_frames(path.clone(), frames));
        info!("Recording to {}", path.display());

        self.active = Some(ActiveCapture { path, writer });
        Ok(())
    }

    async fn stop(&mut self) -> Result<CaptureStatus> {
        let Some(active) = self.active.take() else {
            return Ok(CaptureStatus {
                was_recording: false,
                path: None,
            });
        };

        let was_recording = self.source.is_capturing();
        self.source
            .stop()
            .await
            .context("Failed to stop audio capture")?;

        let sample_count = active.writer.await.context("WAV writer task panicked")??;

        info!(
            "Recording stopped: {} ({} samples)",
            active.path.display(),
            sample_count
        );

        let path = active.path.exists().then_some(active.path);
        Ok(CaptureStatus {
            was_recording,
            path,
        })
    }

    async fn release(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        warn!("Releasing in-progress recording: {}", active.path.display());

        if let Err(e) = self.source.stop().await {
            warn!("Failed to stop audio capture during release: {}", e);
        }
        active.writer.abort();
        let _ = active.writer.await;
        remove_partial(&active.path);
    }

    fn name(&self) -> &str {
        self.source.name()
    }
}

/// Drain frames into a WAV file; the file is created on the first frame
async fn write_frames(path: PathBuf, mut frames: mpsc::Receiver<AudioFrame>) -> Result<usize> {
    let mut writer: Option<hound::WavWriter<BufWriter<File>>> = None;
    let mut sample_count = 0;

    while let Some(frame) = frames.recv().await {
        if writer.is_none() {
            let spec = hound::WavSpec {
                channels: frame.channels,
                sample_rate: frame.sample_rate,
                bits_per_sample: 16,
                sample_format: hound::SampleFormat::Int,
            };
            writer = Some(
                hound::WavWriter::create(&path, spec)
                    .with_context(|| format!("Failed to create WAV file: {:?}", path))?,
            );
        }
        let Some(wav) = writer.as_mut() else {
            continue;
        };

        for &sample in &frame.samples {
            wav.write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
        sample_count += frame.samples.len();
    }

    if let Some(wav) = writer {
        wav.finalize().context("Failed to finalize WAV file")?;
    }

    Ok(sample_count)
}

fn remove_partial(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove partial recording {}: {}", path.display(), e);
        }
    }
}
