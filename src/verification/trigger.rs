//! Verification session admission
//!
//! At most one unfinished session exists at a time. The trigger owns the
//! current session reference and updates it synchronously for each inbound
//! message, so two overlapping messages can never both start a session.

use super::session::{InboundMessage, SessionFactory, VerificationSession};
use futures::StreamExt;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Default inbox capacity
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Verification inbox is closed")]
    InboxClosed,

    #[error("Verification inbox is full")]
    InboxFull,
}

/// Why an inbound message did not start a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another session is still running
    SessionInProgress,
    /// The message belongs to the running session
    CurrentSession,
    /// The message belongs to a session that already finished
    StaleTransaction,
    /// Only requests and starts open sessions
    NotAStart,
}

/// Outcome of offering one message to the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Started,
    Ignored(IgnoreReason),
}

/// Counters from one run of the inbox loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub started: usize,
    pub ignored: usize,
}

/// Sending half of the trigger's bounded inbox
#[derive(Debug, Clone)]
pub struct VerificationInbox {
    tx: mpsc::Sender<InboundMessage>,
}

impl VerificationInbox {
    /// Deliver `message`, waiting for room in the inbox.
    pub async fn deliver(&self, message: InboundMessage) -> Result<(), VerificationError> {
        self.tx
            .send(message)
            .await
            .map_err(|_| VerificationError::InboxClosed)
    }

    /// Deliver `message` without waiting.
    pub fn try_deliver(&self, message: InboundMessage) -> Result<(), VerificationError> {
        self.tx.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => VerificationError::InboxFull,
            mpsc::error::TrySendError::Closed(_) => VerificationError::InboxClosed,
        })
    }
}

/// Bounded inbox for [`VerificationTrigger::run`].
pub fn inbox(capacity: usize) -> (VerificationInbox, mpsc::Receiver<InboundMessage>) {
    let (tx, rx) = mpsc::channel(capacity);
    (VerificationInbox { tx }, rx)
}

pub struct VerificationTrigger<F: SessionFactory> {
    factory: F,
    current: Mutex<Option<Arc<F::Session>>>,
}

impl<F: SessionFactory> VerificationTrigger<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            current: Mutex::new(None),
        }
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<Arc<F::Session>>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The most recent session, finished or not
    pub fn current_session(&self) -> Option<Arc<F::Session>> {
        self.current_slot().clone()
    }

    /// Decide whether `message` starts a session, and start it if so.
    pub fn handle_message(&self, message: &InboundMessage) -> Admission {
        let mut current = self.current_slot();

        if let Some(session) = current.as_ref() {
            let same_channel = message.transaction_id() == Some(session.channel_id());
            let reason = match (session.is_finished(), same_channel) {
                (false, false) => Some(IgnoreReason::SessionInProgress),
                (false, true) => Some(IgnoreReason::CurrentSession),
                (true, true) => Some(IgnoreReason::StaleTransaction),
                (true, false) => None,
            };
            if let Some(reason) = reason {
                debug!(
                    sender = %message.sender,
                    channel_id = %session.channel_id(),
                    ?reason,
                    "ignoring verification message"
                );
                return Admission::Ignored(reason);
            }
        }

        if !message.kind.starts_session() {
            return Admission::Ignored(IgnoreReason::NotAStart);
        }

        let session = Arc::new(self.factory.begin(message));
        info!(
            sender = %message.sender,
            channel_id = %session.channel_id(),
            "verification session started"
        );
        *current = Some(session);
        Admission::Started
    }

    /// Start a session toward `user_id` with a fresh transaction id.
    ///
    /// Returns `None` while another session is unfinished.
    pub fn request(&self, user_id: &str) -> Option<Arc<F::Session>> {
        let mut current = self.current_slot();
        if current.as_ref().is_some_and(|session| !session.is_finished()) {
            debug!(user_id = %user_id, "verification already in progress");
            return None;
        }

        let transaction_id = uuid::Uuid::new_v4().to_string();
        let session = Arc::new(self.factory.request(user_id, &transaction_id));
        info!(user_id = %user_id, %transaction_id, "verification requested");
        *current = Some(session.clone());
        Some(session)
    }

    /// Admit messages from `inbox` until every sender is dropped.
    pub async fn run(&self, inbox: mpsc::Receiver<InboundMessage>) -> TriggerStats {
        let mut messages = ReceiverStream::new(inbox);
        let mut stats = TriggerStats::default();

        while let Some(message) = messages.next().await {
            match self.handle_message(&message) {
                Admission::Started => stats.started += 1,
                Admission::Ignored(_) => stats.ignored += 1,
            }
        }

        debug!(started = stats.started, ignored = stats.ignored, "verification inbox closed");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::session::{MessageKind, MockSessionFactory};
    use serde_json::json;

    fn message(kind: MessageKind, txn: &str) -> InboundMessage {
        InboundMessage::new(kind, "@bob:hs", json!({ "transaction_id": txn }))
    }

    #[test]
    fn test_request_starts_session() {
        let trigger = VerificationTrigger::new(MockSessionFactory::new());

        assert_eq!(
            trigger.handle_message(&message(MessageKind::Request, "t1")),
            Admission::Started
        );
        assert_eq!(trigger.current_session().unwrap().channel_id, "t1");
    }

    #[test]
    fn test_other_messages_never_start() {
        let trigger = VerificationTrigger::new(MockSessionFactory::new());

        assert_eq!(
            trigger.handle_message(&message(MessageKind::Other, "t1")),
            Admission::Ignored(IgnoreReason::NotAStart)
        );
        assert!(trigger.current_session().is_none());
    }

    #[test]
    fn test_competing_session_is_ignored() {
        let factory = MockSessionFactory::new();
        let trigger = VerificationTrigger::new(factory.clone());
        trigger.handle_message(&message(MessageKind::Start, "t1"));

        assert_eq!(
            trigger.handle_message(&message(MessageKind::Start, "t2")),
            Admission::Ignored(IgnoreReason::SessionInProgress)
        );
        assert_eq!(
            trigger.handle_message(&message(MessageKind::Request, "t1")),
            Admission::Ignored(IgnoreReason::CurrentSession)
        );
        assert_eq!(factory.created().len(), 1);
    }

    #[test]
    fn test_finished_session_is_replaced() {
        let factory = MockSessionFactory::new();
        let trigger = VerificationTrigger::new(factory.clone());
        trigger.handle_message(&message(MessageKind::Start, "t1"));
        trigger.current_session().unwrap().finish();

        assert_eq!(
            trigger.handle_message(&message(MessageKind::Start, "t1")),
            Admission::Ignored(IgnoreReason::StaleTransaction)
        );
        assert_eq!(
            trigger.handle_message(&message(MessageKind::Request, "t2")),
            Admission::Started
        );
        assert_eq!(trigger.current_session().unwrap().channel_id, "t2");
        assert_eq!(factory.created().len(), 2);
    }

    #[test]
    fn test_outbound_request() {
        let trigger = VerificationTrigger::new(MockSessionFactory::new());

        let session = trigger.request("@bob:hs").unwrap();
        assert_eq!(session.peer, "@bob:hs");
        assert!(uuid::Uuid::parse_str(&session.channel_id).is_ok());
        assert!(trigger.request("@carol:hs").is_none());

        session.finish();
        assert!(trigger.request("@carol:hs").is_some());
    }

    #[tokio::test]
    async fn test_run_drains_inbox() {
        let factory = MockSessionFactory::new();
        let trigger = VerificationTrigger::new(factory.clone());
        let (inbox, rx) = inbox(DEFAULT_INBOX_CAPACITY);

        inbox.deliver(message(MessageKind::Request, "t1")).await.unwrap();
        inbox.deliver(message(MessageKind::Other, "t1")).await.unwrap();
        inbox.deliver(message(MessageKind::Start, "t2")).await.unwrap();
        drop(inbox);

        let stats = trigger.run(rx).await;
        assert_eq!(stats, TriggerStats { started: 1, ignored: 2 });
        assert_eq!(factory.created().len(), 1);
    }

    #[test]
    fn test_inbox_errors() {
        let (inbox, rx) = inbox(1);
        inbox.try_deliver(message(MessageKind::Start, "t1")).unwrap();
        assert_eq!(
            inbox.try_deliver(message(MessageKind::Start, "t2")),
            Err(VerificationError::InboxFull)
        );

        drop(rx);
        assert_eq!(
            inbox.try_deliver(message(MessageKind::Start, "t3")),
            Err(VerificationError::InboxClosed)
        );
    }
}
