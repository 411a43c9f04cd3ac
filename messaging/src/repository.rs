//! Conversation repository and read-state tracking for the current
//! authenticated user.
//!
//! Single source of truth for reading and mutating conversation state:
//! listing enriched conversations, listing messages, sending, creating
//! conversations (with direct de-duplication), and marking read.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use careline_core::{
    Conversation, ConversationParticipant, ConversationType, EnrichedConversation,
    EnrichedMessage, MessageKind, MessagePriority, MessagingError, ParticipantProfile,
    ParticipantRole, PlatformMessage, Profile, Result,
};
use storage::MessagingStore;

use crate::identity::Identity;
use crate::resolver::find_direct_conversation;

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn MessagingStore>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn MessagingStore>) -> Self {
        Self { store }
    }

    /// Every conversation the user participates in, enriched with participant
    /// profiles, the latest message, and the user's unread count; ordered by
    /// most recent activity first. Empty vec when the user has none.
    pub async fn list_conversations(
        &self,
        identity: &Identity,
    ) -> Result<Vec<EnrichedConversation>> {
        let user_id = identity.user_id();
        let conversation_ids = self.store.conversation_ids_for_user(user_id).await?;

        let mut enriched = Vec::with_capacity(conversation_ids.len());
        for conversation_id in &conversation_ids {
            let Some(conversation) = self.store.get_conversation(conversation_id).await? else {
                // Membership row without a conversation row; skip rather
                // than fail the whole list.
                debug!(%conversation_id, "Skipping dangling membership");
                continue;
            };

            let participants = self.store.participants_of(conversation_id).await?;
            let participant_ids: Vec<String> =
                participants.iter().map(|p| p.user_id.clone()).collect();
            let profiles = self.profiles_by_id(&participant_ids).await?;

            let participants = participants
                .into_iter()
                .map(|participant| ParticipantProfile {
                    profile: profiles.get(&participant.user_id).cloned(),
                    participant,
                })
                .collect();

            // Absent for conversations with no messages yet; never an error.
            let last_message = self.store.latest_message(conversation_id).await?;
            let unread_count = self
                .store
                .count_unread_from_others(conversation_id, user_id)
                .await?;

            enriched.push(EnrichedConversation {
                conversation,
                participants,
                last_message,
                unread_count,
            });
        }

        enriched.sort_by(|a, b| {
            b.conversation
                .activity_at()
                .cmp(&a.conversation.activity_at())
        });

        debug!(user_id, count = enriched.len(), "Listed conversations");
        Ok(enriched)
    }

    /// Messages of a conversation, chronological ascending, each with the
    /// sender's profile resolved. `NotFound` when the conversation does not
    /// exist. No pagination; callers get the full history.
    pub async fn list_messages(&self, conversation_id: &str) -> Result<Vec<EnrichedMessage>> {
        self.require_conversation(conversation_id).await?;

        let messages = self.store.messages_in(conversation_id).await?;
        let sender_ids: Vec<String> = messages
            .iter()
            .map(|m| m.sender_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let profiles = self.profiles_by_id(&sender_ids).await?;

        Ok(messages
            .into_iter()
            .map(|message| EnrichedMessage {
                sender: profiles.get(&message.sender_id).cloned(),
                message,
            })
            .collect())
    }

    /// Persists a text message with the body verbatim; trim-validation is the
    /// caller's concern. The conversation's `last_message_at` is refreshed by
    /// the storage layer, not here.
    ///
    /// No idempotency key: a caller-side retry after an ambiguous failure can
    /// duplicate the message, so callers must not retry writes.
    pub async fn send_message(
        &self,
        conversation_id: &str,
        identity: &Identity,
        body: &str,
    ) -> Result<PlatformMessage> {
        let message = PlatformMessage::new(
            conversation_id,
            identity.user_id(),
            body,
            MessageKind::Text,
            MessagePriority::Normal,
        );
        self.store.insert_message(&message).await?;

        info!(
            message_id = %message.id,
            conversation_id,
            sender_id = identity.user_id(),
            "Sent message"
        );
        Ok(message)
    }

    /// Creates a conversation with the creator as `owner` and every other
    /// given user as `participant` (deduplicated against the creator and
    /// each other).
    ///
    /// A `Direct` conversation must resolve to exactly one other
    /// participant; anything else fails with
    /// [`MessagingError::InvalidParticipants`] before any write, keeping the
    /// two-participants-per-direct-conversation invariant intact. When the
    /// pair already has a direct conversation it is returned unchanged
    /// instead of creating a duplicate.
    pub async fn create_conversation(
        &self,
        identity: &Identity,
        participant_ids: &[String],
        conversation_type: ConversationType,
        title: Option<&str>,
        context: Option<(&str, &str)>,
    ) -> Result<Conversation> {
        let creator_id = identity.user_id();

        let others: Vec<String> = participant_ids
            .iter()
            .filter(|id| id.as_str() != creator_id)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if conversation_type == ConversationType::Direct {
            if others.len() != 1 {
                return Err(MessagingError::InvalidParticipants(format!(
                    "a direct conversation needs exactly one other participant, got {}",
                    others.len()
                )));
            }
            if let Some(existing) =
                find_direct_conversation(self.store.as_ref(), creator_id, &others[0]).await?
            {
                return Ok(existing);
            }
        }

        let (context_type, context_id) = match context {
            Some((context_type, context_id)) => {
                (Some(context_type.to_string()), Some(context_id.to_string()))
            }
            None => (None, None),
        };
        let conversation = Conversation::new(
            conversation_type,
            title.map(str::to_string),
            context_type,
            context_id,
            false,
        );
        self.store.insert_conversation(&conversation).await?;

        let mut participants = vec![ConversationParticipant::new(
            &conversation.id,
            creator_id,
            ParticipantRole::Owner,
        )];
        for user_id in &others {
            participants.push(ConversationParticipant::new(
                &conversation.id,
                user_id,
                ParticipantRole::Participant,
            ));
        }
        self.store.insert_participants(&participants).await?;

        info!(
            conversation_id = %conversation.id,
            conversation_type = conversation_type.as_str(),
            participant_count = participants.len(),
            "Created conversation"
        );
        Ok(conversation)
    }

    /// Marks the conversation read for the caller: flips `is_read` on every
    /// unread message from other senders and sets the caller's
    /// `last_read_at` to now. Both writes are attempted even if the first
    /// fails; the first failure is reported. Idempotent with respect to
    /// observable message state.
    pub async fn mark_read(&self, conversation_id: &str, identity: &Identity) -> Result<()> {
        self.require_conversation(conversation_id).await?;
        let user_id = identity.user_id();

        let messages_result = self.store.mark_messages_read(conversation_id, user_id).await;
        let last_read_result = self
            .store
            .set_last_read(conversation_id, user_id, Utc::now())
            .await;

        match (messages_result, last_read_result) {
            (Ok(affected), Ok(())) => {
                debug!(conversation_id, user_id, affected, "Marked read");
                Ok(())
            }
            (Err(e), _) => Err(e.into()),
            (_, Err(e)) => Err(e.into()),
        }
    }

    async fn require_conversation(&self, conversation_id: &str) -> Result<Conversation> {
        self.store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| MessagingError::NotFound(format!("conversation {}", conversation_id)))
    }

    async fn profiles_by_id(&self, user_ids: &[String]) -> Result<HashMap<String, Profile>> {
        let profiles = self.store.profiles_by_ids(user_ids).await?;
        Ok(profiles
            .into_iter()
            .map(|profile| (profile.user_id.clone(), profile))
            .collect())
    }
}
