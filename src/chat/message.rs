use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub created_at: DateTime<Utc>,
}

/// Append-only conversation
///
/// Creation times never go backwards, even if the wall clock does.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> &Message {
        let now = Utc::now();
        let created_at = match self.messages.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        };

        self.messages.push(Message {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            created_at,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let mut log = MessageLog::new();
        log.append(Sender::User, "hello");
        log.append(Sender::Assistant, "hi there");

        let messages = log.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Assistant);
        assert!(messages[0].created_at <= messages[1].created_at);
        assert_ne!(messages[0].id, messages[1].id);
    }

    #[test]
    fn test_created_at_never_goes_backwards() {
        let mut log = MessageLog::new();
        log.append(Sender::User, "first");
        // Simulate a clock step backwards by pushing the last timestamp ahead
        log.messages[0].created_at = Utc::now() + chrono::Duration::seconds(60);

        let ahead = log.messages()[0].created_at;
        let next = log.append(Sender::Assistant, "second").created_at;
        assert_eq!(next, ahead);
    }
}
