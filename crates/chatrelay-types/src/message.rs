//! Chat message types for chatrelay.
//!
//! A `Message` is the durable unit of a conversation: immutable once
//! created, only ever appended to a session's history. `ChatEvent` is the
//! wire shape emitted per streamed fragment and for the completed reply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who produced a message.
///
/// A closed two-variant tag fixed at construction time; anything that is
/// not the human turn is assistant output. Maps to the CHECK constraint in
/// the SQLite schema: `CHECK (sender IN ('human', 'assistant'))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Human,
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Human => write!(f, "human"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Sender::Human),
            "assistant" => Ok(Sender::Assistant),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A single message within a chat session.
///
/// Messages are ordered by `timestamp` within a session. No edit or
/// delete path exists; histories only grow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Construct a message stamped with the current time.
    pub fn new(session_id: String, sender: Sender, text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            sender,
            text,
            timestamp: Utc::now(),
        }
    }
}

/// Wire-level event emitted to a live client.
///
/// One `ChatEvent` is sent per streamed fragment, and one more for the
/// completed reply once streaming ends. Fragments are transient: only
/// their concatenation is ever persisted, as one `Message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&Message> for ChatEvent {
    fn from(message: &Message) -> Self {
        Self {
            session_id: message.session_id.clone(),
            sender: message.sender,
            text: message.text.clone(),
            timestamp: message.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_roundtrip() {
        for sender in [Sender::Human, Sender::Assistant] {
            let s = sender.to_string();
            let parsed: Sender = s.parse().unwrap();
            assert_eq!(sender, parsed);
        }
    }

    #[test]
    fn test_sender_serde() {
        let sender = Sender::Assistant;
        let json = serde_json::to_string(&sender).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: Sender = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Sender::Assistant);
    }

    #[test]
    fn test_sender_rejects_unknown() {
        assert!("system".parse::<Sender>().is_err());
        assert!("".parse::<Sender>().is_err());
    }

    #[test]
    fn test_message_new_stamps_time_and_id() {
        let before = Utc::now();
        let msg = Message::new("s1".to_string(), Sender::Human, "hello".to_string());
        assert!(!msg.id.is_nil());
        assert_eq!(msg.session_id, "s1");
        assert_eq!(msg.sender, Sender::Human);
        assert!(msg.timestamp >= before);
    }

    #[test]
    fn test_chat_event_from_message() {
        let msg = Message::new("s1".to_string(), Sender::Assistant, "Hi there".to_string());
        let event = ChatEvent::from(&msg);
        assert_eq!(event.session_id, "s1");
        assert_eq!(event.sender, Sender::Assistant);
        assert_eq!(event.text, "Hi there");
        assert_eq!(event.timestamp, msg.timestamp);
    }

    #[test]
    fn test_message_serialize_shape() {
        let msg = Message::new("s1".to_string(), Sender::Human, "hello".to_string());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"sender\":\"human\""));
        assert!(json.contains("\"session_id\":\"s1\""));
    }
}
