// Unit tests for capture backend abstractions
//
// These tests verify the frame types, the factory and the headless sources.

use std::path::PathBuf;
use tempfile::TempDir;
use tokio::time::{timeout, Duration};
use voicechat::audio::{AudioBackendConfig, AudioBackendFactory, AudioFrame, AudioSource};

fn write_wav(path: &PathBuf, seconds: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..(16000.0 * seconds) as usize {
        writer.write_sample((i % 512) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_audio_backend_config_default() {
    let config = AudioBackendConfig::default();

    assert_eq!(config.target_sample_rate, 16000, "Default should be 16kHz for speech");
    assert_eq!(config.target_channels, 1, "Default should be mono");
    assert_eq!(config.buffer_duration_ms, 100, "Default buffer should be 100ms");
}

#[test]
fn test_samples_per_frame() {
    assert_eq!(AudioBackendConfig::default().samples_per_frame(), 1600);

    let stereo = AudioBackendConfig {
        target_sample_rate: 48000,
        target_channels: 2,
        buffer_duration_ms: 50,
    };
    assert_eq!(stereo.samples_per_frame(), 4800);
}

#[test]
fn test_audio_frame_timing_calculation() {
    let frame = AudioFrame {
        samples: vec![0i16; 1600],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms: 0,
    };

    let duration_secs =
        frame.samples.len() as f64 / (frame.sample_rate as f64 * frame.channels as f64);
    assert!((duration_secs - 0.1).abs() < 0.001, "Duration should be 100ms");
}

#[test]
fn test_audio_source_from_config() {
    let tone: AudioSource =
        serde_json::from_str(r#"{ "kind": "tone", "frequency_hz": 220.0 }"#).unwrap();
    assert_eq!(tone, AudioSource::Tone { frequency_hz: 220.0 });

    let file: AudioSource =
        serde_json::from_str(r#"{ "kind": "file", "path": "/tmp/input.wav" }"#).unwrap();
    assert_eq!(
        file,
        AudioSource::File {
            path: PathBuf::from("/tmp/input.wav")
        }
    );

    assert_eq!(
        AudioSource::default(),
        AudioSource::Tone { frequency_hz: 440.0 }
    );
}

#[test]
fn test_factory_rejects_missing_file() {
    let result = AudioBackendFactory::create(
        AudioSource::File {
            path: PathBuf::from("/nonexistent/input.wav"),
        },
        AudioBackendConfig::default(),
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn test_tone_source_produces_frames_until_stopped() {
    let mut backend = AudioBackendFactory::create(
        AudioSource::default(),
        AudioBackendConfig::default(),
    )
    .unwrap();
    assert_eq!(backend.name(), "tone");
    assert!(!backend.is_capturing());

    let mut frames = backend.start().await.unwrap();
    assert!(backend.is_capturing());
    assert!(backend.start().await.is_err(), "Second start should fail");

    let first = frames.recv().await.unwrap();
    assert_eq!(first.samples.len(), 1600);
    assert_eq!(first.sample_rate, 16000);
    assert_eq!(first.channels, 1);
    assert_eq!(first.timestamp_ms, 0);
    assert!(first.samples.iter().any(|&s| s != 0), "Tone should not be silent");

    let second = frames.recv().await.unwrap();
    assert_eq!(second.timestamp_ms, 100);

    backend.stop().await.unwrap();
    assert!(!backend.is_capturing());

    // Channel closes once the generator is gone
    let drained = timeout(Duration::from_secs(1), async {
        while frames.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());
}

#[tokio::test]
async fn test_file_source_replays_samples() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("input.wav");
    write_wav(&path, 0.25);

    let mut backend = AudioBackendFactory::create(
        AudioSource::File { path: path.clone() },
        AudioBackendConfig::default(),
    )
    .unwrap();
    assert_eq!(backend.name(), "file");

    let mut frames = backend.start().await.unwrap();
    let mut total = 0;
    for _ in 0..3 {
        let frame = frames.recv().await.unwrap();
        total += frame.samples.len();
    }
    assert_eq!(total, 4000, "Whole file replayed in 100ms chunks");

    backend.stop().await.unwrap();
    assert!(!backend.is_capturing());
}
