//! # messaging
//!
//! The Careline conversation and broadcast messaging module: conversation
//! repository with read-state tracking, direct-conversation de-duplication,
//! broadcast fan-out to role/facility recipient groups, and realtime
//! list invalidation over the storage change feed.
//!
//! ## Modules
//!
//! - [`identity`] – Fail-closed authenticated-user boundary
//! - [`repository`] – [`ConversationService`] (list/send/create/mark-read)
//! - [`resolver`] – Direct-conversation lookup between two users
//! - [`broadcast`] – [`BroadcastEngine`] fan-out
//! - [`invalidator`] – [`RealtimeInvalidator`] refetch-on-change guard

pub mod broadcast;
pub mod identity;
pub mod invalidator;
pub mod repository;
pub mod resolver;

pub use broadcast::{BroadcastEngine, BroadcastOutcome};
pub use identity::Identity;
pub use invalidator::RealtimeInvalidator;
pub use repository::ConversationService;
pub use resolver::find_direct_conversation;
