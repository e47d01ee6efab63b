// Integration tests for audio file reading and duration probing

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use voicechat::audio::{probe_duration, AudioFile};

fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..frames {
        for c in 0..channels {
            writer.write_sample(((i * 37 + c as usize) % 2000) as i16 - 1000)?;
        }
    }
    writer.finalize()?;
    Ok(())
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("note.wav");
    write_wav(&path, 16000, 1, 24000)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 24000);
    assert!((audio.duration_seconds - 1.5).abs() < 0.001);
    assert!(audio.path.contains("note.wav"));

    Ok(())
}

#[test]
fn test_audio_file_interleaved_channels() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("stereo.wav");
    write_wav(&path, 44100, 2, 4410)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.channels, 2);
    assert_eq!(audio.samples.len(), 8820, "Samples are interleaved [L, R, ...]");
    assert!((audio.duration_seconds - 0.1).abs() < 0.001);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    assert!(AudioFile::open(&path).is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_probe_duration_of_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("memo.wav");
    write_wav(&path, 16000, 1, 32000)?;

    let duration = probe_duration(&path)?;
    assert!(
        (duration.as_secs_f64() - 2.0).abs() < 0.01,
        "Expected about 2s, got {:?}",
        duration
    );

    Ok(())
}

#[test]
fn test_probe_duration_rejects_garbage() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("broken.m4a");
    std::fs::write(&path, b"definitely not audio")?;

    assert!(probe_duration(&path).is_err());
    Ok(())
}
