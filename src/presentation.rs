//! Bridge to the presentation layer
//!
//! The core never calls into UI code. It publishes a [`Snapshot`] after every
//! state change on a watch channel and emits one-off [`Notice`]s (prompts and
//! alerts) on a broadcast channel. The UI maps notices onto whatever modal
//! mechanism it has.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::chat::Message;
use crate::recording::AudioArtifact;

/// Read-only view rendered by the UI
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub is_recording: bool,
}

/// What the user chooses to do with a finished recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostRecordingDecision {
    Play,
    Transcribe,
    Discard,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    PermissionDenied { message: String },
    TooShort { message: String },
    RecordingFailed { message: String },
    /// Recording validated; the UI should ask for a [`PostRecordingDecision`]
    ArtifactReady { artifact: AudioArtifact },
    PlaybackFailed { message: String },
    PlaybackFinished,
    TranscriptionFailed { message: String },
    /// Speech was transcribed but another message was still being sent
    TranscriptNotSent { text: String, message: String },
    ConnectivityAlert { message: String },
    /// Typed input was submitted and should be cleared from the input box
    ClearInput,
}

pub struct Presenter {
    snapshot: watch::Sender<Snapshot>,
    notices: broadcast::Sender<Notice>,
    /// Outstanding remote calls; `is_loading` is true while any is pending
    loading: AtomicUsize,
}

/// Holds the loading indicator on until dropped
pub struct LoadingGuard<'a> {
    presenter: &'a Presenter,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.presenter.loading.fetch_sub(1, Ordering::SeqCst);
        self.presenter.publish_loading();
    }
}

impl Presenter {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Snapshot::default());
        let (notices, _) = broadcast::channel(64);
        Self {
            snapshot,
            notices,
            loading: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn set_messages(&self, messages: Vec<Message>) {
        self.snapshot.send_modify(|s| s.messages = messages);
    }

    /// Mark a remote call as pending for the lifetime of the guard
    pub fn begin_loading(&self) -> LoadingGuard<'_> {
        self.loading.fetch_add(1, Ordering::SeqCst);
        self.publish_loading();
        LoadingGuard { presenter: self }
    }

    fn publish_loading(&self) {
        // Read under the watch lock so the last writer sees every change
        self.snapshot
            .send_modify(|s| s.is_loading = self.loading.load(Ordering::SeqCst) > 0);
    }

    pub fn set_recording(&self, is_recording: bool) {
        self.snapshot.send_modify(|s| s.is_recording = is_recording);
    }

    pub fn notify(&self, notice: Notice) {
        debug!("Notice: {:?}", notice);
        // No subscribers is fine; the UI may not be listening yet
        let _ = self.notices.send(notice);
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_stays_set_until_last_guard_drops() {
        let presenter = Presenter::new();
        assert!(!presenter.snapshot().is_loading);

        let send = presenter.begin_loading();
        let upload = presenter.begin_loading();
        drop(upload);
        assert!(presenter.snapshot().is_loading);

        drop(send);
        assert!(!presenter.snapshot().is_loading);
    }
}
