// Playback of finished recordings
//
// The backend loads a recording into a sound and reports natural completion
// on a oneshot channel. The manager owns the single loaded sound; whichever of
// completion or an explicit stop takes it out of the slot first is the one
// that unloads it, so it is released exactly once.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audio::{probe_duration, AudioSessionController};
use crate::error::PlaybackError;
use crate::presentation::{Notice, Presenter};
use crate::recording::AudioArtifact;

/// A loaded recording
#[async_trait::async_trait]
pub trait Sound: Send {
    /// Begin playing; the receiver resolves when playback reaches the end
    async fn play(&mut self) -> Result<oneshot::Receiver<()>>;

    /// Stop playing and free the underlying player
    async fn unload(&mut self) -> Result<()>;
}

#[async_trait::async_trait]
pub trait PlaybackBackend: Send + Sync {
    async fn load(&self, artifact: &AudioArtifact) -> Result<Box<dyn Sound>>;

    fn name(&self) -> &str;
}

/// Identifies one `play` call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackHandle(Uuid);

impl PlaybackHandle {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

struct ActivePlayback {
    handle: PlaybackHandle,
    sound: Box<dyn Sound>,
}

pub struct PlaybackManager {
    backend: Box<dyn PlaybackBackend>,
    audio: Arc<AudioSessionController>,
    presenter: Arc<Presenter>,
    active: Arc<Mutex<Option<ActivePlayback>>>,
}

impl PlaybackManager {
    pub fn new(
        backend: Box<dyn PlaybackBackend>,
        audio: Arc<AudioSessionController>,
        presenter: Arc<Presenter>,
    ) -> Arc<Self> {
        info!("Playback manager using {} backend", backend.name());
        Arc::new(Self {
            backend,
            audio,
            presenter,
            active: Arc::new(Mutex::new(None)),
        })
    }

    pub async fn is_playing(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Play a recording, replacing anything already playing
    pub async fn play(
        self: &Arc<Self>,
        artifact: &AudioArtifact,
    ) -> Result<PlaybackHandle, PlaybackError> {
        self.stop_active().await;

        if let Err(e) = self.audio.enter_playback_mode().await {
            return Err(self.report(e.into()));
        }

        let mut sound = match self.backend.load(artifact).await {
            Ok(sound) => sound,
            Err(e) => {
                self.reset_audio().await;
                return Err(self.report(PlaybackError::Load(format!("{:#}", e))));
            }
        };

        let completion = match sound.play().await {
            Ok(completion) => completion,
            Err(e) => {
                if let Err(e) = sound.unload().await {
                    warn!("Failed to unload sound after start failure: {:#}", e);
                }
                self.reset_audio().await;
                return Err(self.report(PlaybackError::Start(format!("{:#}", e))));
            }
        };

        let handle = PlaybackHandle(Uuid::new_v4());
        *self.active.lock().await = Some(ActivePlayback { handle, sound });
        info!(
            "Playing {} ({:?})",
            artifact.uri().display(),
            handle.id()
        );

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            // A dropped sender means the sound was unloaded, not finished
            if completion.await.is_ok() && manager.finish(handle).await {
                info!("Playback {:?} finished", handle.id());
                manager.presenter.notify(Notice::PlaybackFinished);
            }
        });

        Ok(handle)
    }

    /// Stop a playback started by [`play`](Self::play); no-op if it already ended
    pub async fn stop(&self, handle: PlaybackHandle) {
        if self.finish(handle).await {
            info!("Playback {:?} stopped", handle.id());
        } else {
            debug!("Playback {:?} already released", handle.id());
        }
    }

    /// Stop whatever is playing
    pub async fn stop_active(&self) {
        let handle = self.active.lock().await.as_ref().map(|a| a.handle);
        if let Some(handle) = handle {
            self.stop(handle).await;
        }
    }

    /// Release the sound for `handle` if it still owns the slot
    async fn finish(&self, handle: PlaybackHandle) -> bool {
        let released = {
            let mut active = self.active.lock().await;
            match active.as_ref() {
                Some(current) if current.handle == handle => active.take(),
                _ => None,
            }
        };

        let Some(mut playback) = released else {
            return false;
        };

        if let Err(e) = playback.sound.unload().await {
            error!("Failed to unload sound: {:#}", e);
        }
        self.reset_audio().await;
        true
    }

    async fn reset_audio(&self) {
        if let Err(e) = self.audio.exit_to_idle_mode().await {
            error!("Failed to reset audio session after playback: {}", e);
        }
    }

    fn report(&self, err: PlaybackError) -> PlaybackError {
        error!("{}", err);
        self.presenter.notify(Notice::PlaybackFailed {
            message: err.user_message(),
        });
        err
    }
}

/// Playback for hosts without an audio output
///
/// Loading probes the recording's duration; playing holds the sound for that
/// long and then reports completion.
pub struct HeadlessPlayback;

#[async_trait::async_trait]
impl PlaybackBackend for HeadlessPlayback {
    async fn load(&self, artifact: &AudioArtifact) -> Result<Box<dyn Sound>> {
        let path = artifact.uri().to_path_buf();
        let probe_path = path.clone();
        let duration = tokio::task::spawn_blocking(move || probe_duration(probe_path))
            .await
            .context("Duration probe panicked")??;
        debug!("Loaded {} ({:?})", path.display(), duration);
        Ok(Box::new(TimedSound {
            path,
            duration,
            timer: None,
        }))
    }

    fn name(&self) -> &str {
        "headless"
    }
}

struct TimedSound {
    path: PathBuf,
    duration: Duration,
    timer: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl Sound for TimedSound {
    async fn play(&mut self) -> Result<oneshot::Receiver<()>> {
        let (tx, rx) = oneshot::channel();
        let duration = self.duration;
        self.timer = Some(tokio::spawn(async move {
            sleep(duration).await;
            let _ = tx.send(());
        }));
        Ok(rx)
    }

    async fn unload(&mut self) -> Result<()> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        debug!("Unloaded {}", self.path.display());
        Ok(())
    }
}
