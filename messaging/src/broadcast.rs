//! Broadcast fan-out: resolve recipient-group selectors to concrete users,
//! create one group conversation, deliver one message to all.
//!
//! The three writes (conversation, participants, message) are not atomic on
//! the storage side; they run in that fixed order so a midway failure
//! leaves, at worst, an empty conversation rather than an orphaned message.
//! Nothing is rolled back.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use careline_core::{
    Conversation, ConversationParticipant, ConversationType, MessageKind, MessagePriority,
    MessagingError, ParticipantRole, PlatformMessage, RecipientSelector, Result,
};
use storage::MessagingStore;

use crate::identity::Identity;

const DEFAULT_BROADCAST_TITLE: &str = "Broadcast";

/// What a broadcast produced, surfaced for confirmation messaging.
#[derive(Debug, Clone)]
pub struct BroadcastOutcome {
    pub conversation_id: String,
    pub recipients_reached: usize,
}

#[derive(Clone)]
pub struct BroadcastEngine {
    store: Arc<dyn MessagingStore>,
}

impl BroadcastEngine {
    pub fn new(store: Arc<dyn MessagingStore>) -> Self {
        Self { store }
    }

    /// Resolves the selectors, excludes the sender, and delivers one message
    /// to a fresh broadcast conversation.
    ///
    /// Fails with [`MessagingError::EmptyRecipients`] before any write when
    /// the resolved set (minus the sender) is empty.
    pub async fn send_broadcast(
        &self,
        identity: &Identity,
        selectors: &[RecipientSelector],
        body: &str,
        priority: MessagePriority,
    ) -> Result<BroadcastOutcome> {
        let sender_id = identity.user_id();

        let mut recipients = self.resolve_recipients(selectors).await?;
        // Senders do not receive their own broadcast as an unread entry,
        // even when they hold one of the selected roles.
        recipients.remove(sender_id);

        if recipients.is_empty() {
            return Err(MessagingError::EmptyRecipients);
        }

        let conversation = Conversation::new(
            ConversationType::Group,
            Some(DEFAULT_BROADCAST_TITLE.to_string()),
            None,
            None,
            true,
        );
        self.store.insert_conversation(&conversation).await?;

        let mut participants = vec![ConversationParticipant::new(
            &conversation.id,
            sender_id,
            ParticipantRole::Owner,
        )];
        for user_id in &recipients {
            participants.push(ConversationParticipant::new(
                &conversation.id,
                user_id,
                ParticipantRole::Participant,
            ));
        }
        self.store.insert_participants(&participants).await?;

        let message = PlatformMessage::new(
            &conversation.id,
            sender_id,
            body,
            MessageKind::Text,
            priority,
        );
        self.store.insert_message(&message).await?;

        info!(
            conversation_id = %conversation.id,
            sender_id,
            recipients = recipients.len(),
            priority = priority.as_str(),
            "Broadcast delivered"
        );
        Ok(BroadcastOutcome {
            conversation_id: conversation.id,
            recipients_reached: recipients.len(),
        })
    }

    /// Union of the per-selector user sets, deduplicated.
    async fn resolve_recipients(
        &self,
        selectors: &[RecipientSelector],
    ) -> Result<BTreeSet<String>> {
        let mut recipients = BTreeSet::new();
        for selector in selectors {
            let resolved = match selector {
                RecipientSelector::Role { role } => self.store.user_ids_with_role(role).await?,
                RecipientSelector::Facility { facility_id } => {
                    self.store.staff_of_facility(facility_id).await?
                }
            };
            recipients.extend(resolved);
        }
        Ok(recipients)
    }
}
