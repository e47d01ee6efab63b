use crate::pipeline::VoiceChat;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<VoiceChat>,
}

impl AppState {
    pub fn new(chat: Arc<VoiceChat>) -> Self {
        Self { chat }
    }
}
