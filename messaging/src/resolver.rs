//! Direct-conversation lookup between two users.
//!
//! Enforces the "at most one direct conversation per unordered user pair"
//! invariant: [`ConversationService::create_conversation`] consults this
//! before ever creating a `direct` conversation.
//!
//! [`ConversationService::create_conversation`]: crate::ConversationService::create_conversation

use tracing::debug;

use careline_core::{Conversation, ConversationType, Result};
use storage::MessagingStore;

/// Finds the existing direct conversation between two users, if any.
///
/// Intersects both users' conversation memberships, then keeps candidates
/// with exactly two participants and `type = direct`; the first match wins.
/// O(k) store round trips in the number of shared conversations k, which is
/// 0 or 1 in practice.
pub async fn find_direct_conversation(
    store: &dyn MessagingStore,
    user_a: &str,
    user_b: &str,
) -> Result<Option<Conversation>> {
    let mine = store.conversation_ids_for_user(user_a).await?;
    if mine.is_empty() {
        return Ok(None);
    }

    let theirs = store.conversation_ids_for_user(user_b).await?;
    let shared: Vec<&String> = mine.iter().filter(|id| theirs.contains(id)).collect();
    if shared.is_empty() {
        return Ok(None);
    }

    for conversation_id in shared {
        let participants = store.participants_of(conversation_id).await?;
        if participants.len() != 2 {
            continue;
        }
        if let Some(conversation) = store.get_conversation(conversation_id).await? {
            if conversation.conversation_type == ConversationType::Direct {
                debug!(
                    conversation_id = %conversation.id,
                    user_a,
                    user_b,
                    "Found existing direct conversation"
                );
                return Ok(Some(conversation));
            }
        }
    }

    Ok(None)
}
