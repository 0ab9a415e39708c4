//! Inbound verification messages and the session boundary
//!
//! The interactive verification protocol runs elsewhere. This crate only
//! needs to know a session's channel id and whether it has finished.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Kind of an inbound device-to-device verification message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Start,
    /// Any later protocol step (accept, key, mac, cancel, ...)
    Other,
}

impl MessageKind {
    /// Classify a to-device event type.
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "m.key.verification.request" => MessageKind::Request,
            "m.key.verification.start" => MessageKind::Start,
            _ => MessageKind::Other,
        }
    }

    /// Whether a message of this kind may open a session
    pub fn starts_session(&self) -> bool {
        matches!(self, MessageKind::Request | MessageKind::Start)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub sender: String,
    pub content: Value,
}

impl InboundMessage {
    pub fn new(kind: MessageKind, sender: impl Into<String>, content: Value) -> Self {
        Self {
            kind,
            sender: sender.into(),
            content,
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.content.get("transaction_id")?.as_str()
    }
}

/// Handle on a running interactive verification
pub trait VerificationSession: Send + Sync {
    fn channel_id(&self) -> &str;
    fn is_finished(&self) -> bool;
}

/// Creates sessions once the trigger has admitted them
pub trait SessionFactory: Send + Sync {
    type Session: VerificationSession;

    /// Session answering an inbound request or start from `message.sender`
    fn begin(&self, message: &InboundMessage) -> Self::Session;

    /// Session we initiate toward `user_id`
    fn request(&self, user_id: &str, transaction_id: &str) -> Self::Session;
}

/// Session stand-in that finishes when told to
#[derive(Debug, Clone)]
pub struct MockSession {
    pub channel_id: String,
    pub peer: String,
    finished: Arc<AtomicBool>,
}

impl MockSession {
    pub fn new(channel_id: impl Into<String>, peer: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            peer: peer.into(),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

impl VerificationSession for MockSession {
    fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Factory recording every session it creates
#[derive(Clone, Default)]
pub struct MockSessionFactory {
    created: Arc<Mutex<Vec<MockSession>>>,
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<MockSession> {
        self.created.lock().unwrap().clone()
    }

    fn record(&self, session: MockSession) -> MockSession {
        self.created.lock().unwrap().push(session.clone());
        session
    }
}

impl SessionFactory for MockSessionFactory {
    type Session = MockSession;

    fn begin(&self, message: &InboundMessage) -> MockSession {
        let channel_id = message.transaction_id().unwrap_or_default();
        self.record(MockSession::new(channel_id, &message.sender))
    }

    fn request(&self, user_id: &str, transaction_id: &str) -> MockSession {
        self.record(MockSession::new(transaction_id, user_id))
    }
}
