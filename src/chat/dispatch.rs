use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::message::{Message, MessageLog, Sender};
use crate::error::ConnectivityError;
use crate::presentation::{Notice, Presenter};
use crate::transport::{ChatRequest, ChatTransport};

/// Shown in the conversation when the assistant cannot be reached
pub const APOLOGY_TEXT: &str =
    "Sorry, I'm having trouble connecting to the server right now. Please try again.";

/// What a single `send` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank after trimming; nothing appended
    Empty,
    /// Another send was in flight; nothing appended
    Busy,
    /// User message and assistant reply appended
    Replied,
    /// User message and apology appended, connectivity alert raised
    Failed(ConnectivityError),
}

/// The one path from text to the conversation, for typed and spoken input
pub struct MessageDispatch {
    transport: Arc<dyn ChatTransport>,
    thread_id: String,
    log: Mutex<MessageLog>,
    in_flight: AtomicBool,
    presenter: Arc<Presenter>,
}

/// Clears the in-flight flag however `send` exits
struct InFlightGuard<'a> {
    dispatch: &'a MessageDispatch,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.dispatch.in_flight.store(false, Ordering::SeqCst);
    }
}

impl MessageDispatch {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        thread_id: impl Into<String>,
        presenter: Arc<Presenter>,
    ) -> Self {
        Self {
            transport,
            thread_id: thread_id.into(),
            log: Mutex::new(MessageLog::new()),
            in_flight: AtomicBool::new(false),
            presenter,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.log.lock().await.messages().to_vec()
    }

    pub async fn send(&self, text: &str) -> DispatchOutcome {
        let text = text.trim();
        if text.is_empty() {
            warn!("Ignoring empty message");
            return DispatchOutcome::Empty;
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Dropping message: a previous send is still in flight");
            return DispatchOutcome::Busy;
        }
        let _guard = InFlightGuard { dispatch: self };
        let _loading = self.presenter.begin_loading();

        self.append(Sender::User, text).await;
        self.presenter.notify(Notice::ClearInput);

        let request = ChatRequest {
            message: text.to_string(),
            thread_id: self.thread_id.clone(),
        };

        info!("Sending message to assistant (thread {})", self.thread_id);
        match self.transport.send(&request).await {
            Ok(reply) => {
                info!("Assistant replied ({} chars)", reply.response.len());
                self.append(Sender::Assistant, reply.response).await;
                DispatchOutcome::Replied
            }
            Err(e) => {
                error!("Chat transport failed: {}", e);
                let err = ConnectivityError(e.to_string());
                self.append(Sender::Assistant, APOLOGY_TEXT).await;
                self.presenter.notify(Notice::ConnectivityAlert {
                    message: err.user_message(),
                });
                DispatchOutcome::Failed(err)
            }
        }
    }

    async fn append(&self, sender: Sender, text: impl Into<String>) {
        let mut log = self.log.lock().await;
        log.append(sender, text);
        self.presenter.set_messages(log.messages().to_vec());
    }
}
