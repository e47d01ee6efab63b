use anyhow::{Context, Result};
use hound::WavReader;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }
}

/// Probe the playing time of a recorded file
///
/// Uses symphonia so any container the platform recorder produces (M4A, WAV,
/// MP3, ...) works; falls back to the WAV header when the container does not
/// declare a frame count.
pub fn probe_duration(path: impl AsRef<Path>) -> Result<Duration> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open recording: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unrecognized audio container")?;

    let track = probed
        .format
        .default_track()
        .context("Recording has no audio track")?;
    let params = &track.codec_params;

    if let (Some(n_frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            let duration = Duration::from_secs_f64(n_frames as f64 / rate as f64);
            debug!("Probed {}: {:?}", path.display(), duration);
            return Ok(duration);
        }
    }

    let reader = WavReader::open(path).context("Recording does not declare its duration")?;
    let spec = reader.spec();
    Ok(Duration::from_secs_f64(
        reader.duration() as f64 / spec.sample_rate.max(1) as f64,
    ))
}
