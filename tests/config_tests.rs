// Tests for configuration loading

use std::time::Duration;
use tempfile::TempDir;
use voicechat::audio::AudioSource;
use voicechat::Config;

const MINIMAL: &str = r#"
[service]
name = "voicechat-test"

[service.http]
bind = "0.0.0.0"
port = 9000

[backend]
base_url = "http://assistant.local:8000"

[audio]
recordings_path = "~/recordings"
sample_rate = 16000
channels = 1
"#;

#[test]
fn test_shipped_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/voicechat");
    let cfg = Config::load(path).unwrap();

    assert_eq!(cfg.service.http.port, 8765);
    assert_eq!(cfg.backend.thread_id, "mobile_user");
    assert_eq!(cfg.audio.source, AudioSource::Tone { frequency_hz: 440.0 });
    assert!(cfg.permission.microphone);
}

#[test]
fn test_defaults_and_env_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("minimal.toml");
    std::fs::write(&path, MINIMAL).unwrap();
    let path = path.to_str().unwrap();

    let cfg = Config::load(path).unwrap();
    assert_eq!(cfg.backend.thread_id, "mobile_user");
    assert_eq!(cfg.backend.transcription_timeout(), Duration::from_secs(30));
    assert_eq!(cfg.audio.source, AudioSource::default());
    assert!(cfg.permission.microphone);

    let recording = cfg.audio.recording_config();
    assert_eq!(recording.min_duration, Duration::from_millis(1000));
    assert_eq!(recording.min_size_bytes, 1024);

    let backend = cfg.audio.backend_config();
    assert_eq!(backend.target_sample_rate, 16000);
    assert_eq!(backend.buffer_duration_ms, 100);

    let dir = cfg.audio.recordings_dir();
    assert!(!dir.to_string_lossy().starts_with('~'), "Tilde should be expanded");
    assert!(dir.ends_with("recordings"));

    std::env::set_var("VOICECHAT__BACKEND__TRANSCRIPTION_TIMEOUT_SECS", "5");
    let cfg = Config::load(path).unwrap();
    std::env::remove_var("VOICECHAT__BACKEND__TRANSCRIPTION_TIMEOUT_SECS");
    assert_eq!(cfg.backend.transcription_timeout(), Duration::from_secs(5));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load("/nonexistent/voicechat").is_err());
}
