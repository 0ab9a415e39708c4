//! Verification session trigger
//!
//! Inbound verification messages arrive through a bounded inbox; the trigger
//! decides which of them may start the single interactive session.

pub mod session;
pub mod trigger;

pub use session::{
    InboundMessage, MessageKind, MockSession, MockSessionFactory, SessionFactory,
    VerificationSession,
};
pub use trigger::{
    inbox, Admission, IgnoreReason, TriggerStats, VerificationError, VerificationInbox,
    VerificationTrigger, DEFAULT_INBOX_CAPACITY,
};
