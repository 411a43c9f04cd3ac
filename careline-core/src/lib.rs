//! # careline-core
//!
//! Core types and errors for the Careline conversation/broadcast messaging module:
//! conversations, participants, platform messages, recipient selectors, the error
//! taxonomy, and tracing initialization. Storage-agnostic; used by the `storage`
//! and `messaging` crates.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{MessagingError, Result};
pub use logger::init_tracing;
pub use types::{
    Conversation, ConversationParticipant, ConversationType, EnrichedConversation,
    EnrichedMessage, MessageKind, MessagePriority, ParticipantProfile, ParticipantRole,
    PlatformMessage, Profile, RecipientSelector,
};
