//! Assistant backend transports
//!
//! The core only sees the two traits here. `http` implements them against the
//! assistant's REST API.

pub mod http;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

pub use http::{HttpChatTransport, HttpTranscriptionTransport};

/// Body of a chat request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: String,
}

/// Body of a chat reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Recorded audio ready for upload
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    /// Container format, e.g. `audio/m4a`
    pub mime_type: String,
}

/// Body of a transcription reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionReply {
    #[serde(default)]
    pub text: Option<String>,
}

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<ChatReply, TransportError>;
}

#[async_trait::async_trait]
pub trait TranscriptionTransport: Send + Sync {
    async fn transcribe(&self, upload: AudioUpload) -> Result<TranscriptionReply, TransportError>;
}
