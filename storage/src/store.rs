//! The backend contract for the messaging module.
//!
//! The `MessagingStore` trait models the hosted Data Access Layer as typed
//! operations over the messaging tables (`conversations`,
//! `conversation_participants`, `platform_messages`) plus read-only lookups
//! (`profiles`, `user_roles`, `facility_staff`) and a change-event feed.
//! Implemented by storage backends ([`SqliteStore`](crate::SqliteStore)).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use careline_core::{Conversation, ConversationParticipant, PlatformMessage, Profile};

use crate::error::StorageError;
use crate::events::ChangeEvent;

/// Trait for reading and mutating messaging state.
///
/// Writes return only what was persisted; enrichment (profiles, unread
/// counts) is composed by callers from the read operations.
#[async_trait]
pub trait MessagingStore: Send + Sync {
    // -- conversations --

    /// Inserts a new conversation row.
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StorageError>;

    /// Fetches a conversation by id. Returns `None` if not found.
    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError>;

    // -- participants --

    /// Bulk-inserts participant rows. Fails with `AlreadyExists` if a
    /// (conversation, user) pair is already present.
    async fn insert_participants(
        &self,
        participants: &[ConversationParticipant],
    ) -> Result<(), StorageError>;

    /// All participants of a conversation.
    async fn participants_of(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationParticipant>, StorageError>;

    /// Ids of every conversation the user participates in.
    async fn conversation_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, StorageError>;

    /// Sets the user's last-read timestamp for a conversation. A no-op when
    /// the user is not a participant.
    async fn set_last_read(
        &self,
        conversation_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    // -- messages --

    /// Inserts a message and refreshes the parent conversation's
    /// `last_message_at` in the same call (the hosted backend does this via
    /// a trigger; callers never update it separately).
    async fn insert_message(&self, message: &PlatformMessage) -> Result<(), StorageError>;

    /// Messages of a conversation, chronological ascending.
    async fn messages_in(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<PlatformMessage>, StorageError>;

    /// The single most recent message of a conversation, if any.
    async fn latest_message(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PlatformMessage>, StorageError>;

    /// Count of unread messages in the conversation authored by someone
    /// other than `user_id`.
    async fn count_unread_from_others(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<i64, StorageError>;

    /// Flips `is_read` on every unread message in the conversation authored
    /// by someone other than `reader_id`. Returns the number of rows changed.
    async fn mark_messages_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, StorageError>;

    // -- lookups --

    /// Profiles for the given user ids; missing users are simply absent.
    async fn profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<Profile>, StorageError>;

    /// User ids currently holding a role.
    async fn user_ids_with_role(&self, role: &str) -> Result<Vec<String>, StorageError>;

    /// User ids on staff at a facility.
    async fn staff_of_facility(&self, facility_id: &str) -> Result<Vec<String>, StorageError>;

    // -- lookup-table seeding (owned by the wider platform in production) --

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    async fn grant_role(&self, user_id: &str, role: &str) -> Result<(), StorageError>;

    async fn add_facility_staff(
        &self,
        facility_id: &str,
        user_id: &str,
    ) -> Result<(), StorageError>;

    // -- change feed --

    /// Subscribes to change events on the messaging tables. The receiver is
    /// the subscription handle; dropping it releases the subscription.
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
