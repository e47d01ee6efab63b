use std::path::Path;
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use crate::chat::{DispatchOutcome, MessageDispatch};
use crate::error::{TranscriptionError, TransportError};
use crate::presentation::{Notice, Presenter};
use crate::recording::AudioArtifact;
use crate::transport::{AudioUpload, TranscriptionTransport};

pub const DEFAULT_TRANSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);

const BUSY_MESSAGE: &str =
    "Your previous message is still being sent. Try again once it has finished.";

/// Transcribed text and what happened when it was handed to chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub delivery: DispatchOutcome,
}

impl Transcript {
    /// The text is in the conversation (replied to or not)
    pub fn reached_conversation(&self) -> bool {
        matches!(
            self.delivery,
            DispatchOutcome::Replied | DispatchOutcome::Failed(_)
        )
    }
}

/// Sends recordings for transcription and feeds the text into chat
pub struct TranscriptionOrchestrator {
    transport: Arc<dyn TranscriptionTransport>,
    dispatch: Arc<MessageDispatch>,
    presenter: Arc<Presenter>,
    timeout: Duration,
}

impl TranscriptionOrchestrator {
    pub fn new(
        transport: Arc<dyn TranscriptionTransport>,
        dispatch: Arc<MessageDispatch>,
        presenter: Arc<Presenter>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            dispatch,
            presenter,
            timeout,
        }
    }

    /// Transcribe a recording and, if it contains speech, send it as a message
    pub async fn transcribe(&self, artifact: &AudioArtifact) -> Result<Transcript, TranscriptionError> {
        let result = {
            let _loading = self.presenter.begin_loading();
            self.request_text(artifact).await
        };

        let text = match result {
            Ok(text) => text,
            Err(err) => {
                error!("Transcription of {} failed: {}", artifact.uri().display(), err);
                self.presenter.notify(Notice::TranscriptionFailed {
                    message: err.user_message(),
                });
                return Err(err);
            }
        };

        info!("Transcribed {} chars, forwarding to chat", text.len());
        let delivery = self.dispatch.send(&text).await;
        match &delivery {
            DispatchOutcome::Busy => {
                warn!("Transcribed text not sent: a message is in flight");
                self.presenter.notify(Notice::TranscriptNotSent {
                    text: text.clone(),
                    message: BUSY_MESSAGE.to_string(),
                });
            }
            DispatchOutcome::Failed(e) => warn!("Transcribed text could not be delivered: {}", e),
            DispatchOutcome::Empty | DispatchOutcome::Replied => {}
        }

        Ok(Transcript { text, delivery })
    }

    async fn request_text(&self, artifact: &AudioArtifact) -> Result<String, TranscriptionError> {
        let bytes = tokio::fs::read(artifact.uri())
            .await
            .map_err(|e| TranscriptionError::Unknown(format!("Failed to read recording: {}", e)))?;

        let upload = AudioUpload {
            bytes,
            file_name: file_name(artifact.uri()),
            mime_type: mime_type(artifact.uri()).to_string(),
        };

        let reply = match timeout(self.timeout, self.transport.transcribe(upload)).await {
            Err(_) => return Err(TranscriptionError::TimedOut),
            Ok(Err(e)) => return Err(classify(e)),
            Ok(Ok(reply)) => reply,
        };

        let text = reply.text.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(TranscriptionError::NoSpeechDetected);
        }
        Ok(text)
    }
}

fn classify(err: TransportError) -> TranscriptionError {
    match err {
        TransportError::Timeout => TranscriptionError::TimedOut,
        TransportError::NotFound => TranscriptionError::BackendUnavailable,
        other => TranscriptionError::Unknown(other.to_string()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("recording.m4a")
        .to_string()
}

/// Container tag for the upload, from the file extension
fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        Some("caf") => "audio/x-caf",
        _ => "audio/m4a",
    }
}
