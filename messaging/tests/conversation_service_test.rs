//! Integration tests for [`messaging::ConversationService`].
//!
//! Covers direct-conversation de-duplication, participant uniqueness,
//! enriched listing, unread counts, read-state tracking, and not-found
//! surfacing, using an in-memory SQLite store.

use std::sync::Arc;

use careline_core::{
    ConversationType, MessagingError, ParticipantRole, Profile,
};
use messaging::{ConversationService, Identity};
use storage::{MessagingStore, SqliteStore};

async fn new_service() -> (ConversationService, Arc<SqliteStore>) {
    let store = Arc::new(
        SqliteStore::new("sqlite::memory:")
            .await
            .expect("Failed to create store"),
    );
    (ConversationService::new(store.clone()), store)
}

fn identity(user_id: &str) -> Identity {
    Identity::from_session(Some(user_id)).expect("Should be authenticated")
}

/// **Test: Direct-conversation creation is idempotent per user pair.**
///
/// **Setup:** Empty store; users "a" and "b".
/// **Action:** `create_conversation(a, [b], Direct)` twice; then once as "b" towards "a".
/// **Expected:** All three calls return the same conversation id; "a" participates in exactly one conversation.
#[tokio::test]
async fn test_direct_conversation_idempotent() {
    let (service, store) = new_service().await;
    let a = identity("a");
    let b = identity("b");

    let first = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");

    let second = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    assert_eq!(first.id, second.id);

    // The pair is unordered: the same conversation resolves from either side.
    let third = service
        .create_conversation(&b, &["a".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    assert_eq!(first.id, third.id);

    let ids = store
        .conversation_ids_for_user("a")
        .await
        .expect("Failed to list ids");
    assert_eq!(ids.len(), 1);
}

/// **Test: Participant list dedup against duplicates and the creator.**
///
/// **Setup:** Creator "a"; requested participants `[b, b, a, c]`.
/// **Action:** `create_conversation(a, ..., Group)`.
/// **Expected:** Three participant rows: a as owner, b and c as participants; no duplicates.
#[tokio::test]
async fn test_participant_dedup() {
    let (service, store) = new_service().await;
    let a = identity("a");

    let conversation = service
        .create_conversation(
            &a,
            &[
                "b".to_string(),
                "b".to_string(),
                "a".to_string(),
                "c".to_string(),
            ],
            ConversationType::Group,
            Some("Care team"),
            None,
        )
        .await
        .expect("Failed to create conversation");

    let participants = store
        .participants_of(&conversation.id)
        .await
        .expect("Failed to list participants");
    assert_eq!(participants.len(), 3);

    let mut user_ids: Vec<&str> = participants.iter().map(|p| p.user_id.as_str()).collect();
    user_ids.sort();
    assert_eq!(user_ids, vec!["a", "b", "c"]);

    for participant in &participants {
        let expected = if participant.user_id == "a" {
            ParticipantRole::Owner
        } else {
            ParticipantRole::Participant
        };
        assert_eq!(participant.role, expected);
    }
}

/// **Test: A direct conversation admits exactly one other participant.**
///
/// **Setup:** Creator "a".
/// **Action:** `create_conversation(a, [b, c], Direct)` and
/// `create_conversation(a, [a], Direct)`.
/// **Expected:** Both fail with `InvalidParticipants` before any write; "a"
/// participates in no conversation afterwards.
#[tokio::test]
async fn test_direct_requires_exactly_one_other_participant() {
    let (service, store) = new_service().await;
    let a = identity("a");

    let two_others = service
        .create_conversation(
            &a,
            &["b".to_string(), "c".to_string()],
            ConversationType::Direct,
            None,
            None,
        )
        .await;
    assert!(matches!(
        two_others,
        Err(MessagingError::InvalidParticipants(_))
    ));

    // Only the creator: after dedup against the creator nobody is left.
    let creator_only = service
        .create_conversation(&a, &["a".to_string()], ConversationType::Direct, None, None)
        .await;
    assert!(matches!(
        creator_only,
        Err(MessagingError::InvalidParticipants(_))
    ));

    let ids = store
        .conversation_ids_for_user("a")
        .await
        .expect("Failed to list ids");
    assert!(ids.is_empty());
}

/// **Test: Direct de-duplication skips shared conversations that are not
/// two-person direct ones.**
///
/// **Setup:** "a" and "b" share a two-person Group conversation and a
/// three-person Group conversation (with "c").
/// **Action:** `create_conversation(a, [b], Direct)` twice.
/// **Expected:** The first call creates a fresh direct conversation distinct
/// from both groups; the second call returns that same direct conversation.
#[tokio::test]
async fn test_direct_dedup_skips_group_and_multiparty_conversations() {
    let (service, _store) = new_service().await;
    let a = identity("a");

    let pair_group = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Group, None, None)
        .await
        .expect("Failed to create conversation");
    let multiparty_group = service
        .create_conversation(
            &a,
            &["b".to_string(), "c".to_string()],
            ConversationType::Group,
            None,
            None,
        )
        .await
        .expect("Failed to create conversation");

    let direct = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    assert_eq!(direct.conversation_type, ConversationType::Direct);
    assert_ne!(direct.id, pair_group.id);
    assert_ne!(direct.id, multiparty_group.id);

    let again = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    assert_eq!(again.id, direct.id);
}

/// **Test: Group conversations are never de-duplicated.**
///
/// **Setup:** Creator "a", participant "b".
/// **Action:** Create two Group conversations with identical inputs.
/// **Expected:** Two distinct conversation ids.
#[tokio::test]
async fn test_group_conversations_always_created() {
    let (service, _store) = new_service().await;
    let a = identity("a");

    let first = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Group, None, None)
        .await
        .expect("Failed to create conversation");
    let second = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Group, None, None)
        .await
        .expect("Failed to create conversation");

    assert_ne!(first.id, second.id);
}

/// **Test: Listing is empty for a user with no conversations, and tolerates
/// conversations with zero messages.**
///
/// **Setup:** User "a" with one fresh conversation and no messages.
/// **Action:** `list_conversations` for "c" (stranger) and for "a".
/// **Expected:** Empty vec for "c"; for "a" one entry with `last_message`
/// absent and unread count 0.
#[tokio::test]
async fn test_list_conversations_empty_and_messageless() {
    let (service, _store) = new_service().await;
    let a = identity("a");
    let c = identity("c");

    service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");

    let strangers = service
        .list_conversations(&c)
        .await
        .expect("Failed to list conversations");
    assert!(strangers.is_empty());

    let mine = service
        .list_conversations(&a)
        .await
        .expect("Failed to list conversations");
    assert_eq!(mine.len(), 1);
    assert!(mine[0].last_message.is_none());
    assert_eq!(mine[0].unread_count, 0);
}

/// **Test: Conversations are ordered most-recent-activity first.**
///
/// **Setup:** Two conversations for "a"; a message lands in the first-created one last.
/// **Action:** `list_conversations(a)`.
/// **Expected:** The conversation with the newer message comes first.
#[tokio::test]
async fn test_list_conversations_activity_order() {
    let (service, _store) = new_service().await;
    let a = identity("a");

    let older = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let newer = service
        .create_conversation(&a, &["c".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let listed = service
        .list_conversations(&a)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].conversation.id, newer.id);

    // A new message in the older conversation moves it to the front.
    service
        .send_message(&older.id, &a, "ping")
        .await
        .expect("Failed to send message");

    let listed = service
        .list_conversations(&a)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].conversation.id, older.id);
}

/// **Test: Unread count tracks foreign unread messages exactly.**
///
/// **Setup:** Direct conversation between "a" and "b".
/// **Action:** "a" sends two messages; "b" lists; "b" marks read; "a" sends one more.
/// **Expected:** "b" sees unread 2, then 0, then 1. "a" never counts their own messages.
#[tokio::test]
async fn test_unread_count_lifecycle() {
    let (service, _store) = new_service().await;
    let a = identity("a");
    let b = identity("b");

    let conversation = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");

    service
        .send_message(&conversation.id, &a, "one")
        .await
        .expect("Failed to send message");
    service
        .send_message(&conversation.id, &a, "two")
        .await
        .expect("Failed to send message");

    let listed = service
        .list_conversations(&b)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].unread_count, 2);

    let listed_for_a = service
        .list_conversations(&a)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed_for_a[0].unread_count, 0);

    service
        .mark_read(&conversation.id, &b)
        .await
        .expect("Failed to mark read");

    let listed = service
        .list_conversations(&b)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].unread_count, 0);

    service
        .send_message(&conversation.id, &a, "three")
        .await
        .expect("Failed to send message");

    let listed = service
        .list_conversations(&b)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].unread_count, 1);
}

/// **Test: mark_read flips foreign messages, sets last_read_at, and is idempotent.**
///
/// **Setup:** Direct conversation; "a" sent one message.
/// **Action:** `mark_read` as "b", twice.
/// **Expected:** The message reads `is_read = true` after the first call;
/// "b"'s participant row carries `last_read_at`; the second call changes
/// nothing observable about messages.
#[tokio::test]
async fn test_mark_read_monotonic_and_idempotent() {
    let (service, store) = new_service().await;
    let a = identity("a");
    let b = identity("b");

    let conversation = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    service
        .send_message(&conversation.id, &a, "Hello")
        .await
        .expect("Failed to send message");

    service
        .mark_read(&conversation.id, &b)
        .await
        .expect("Failed to mark read");

    let messages = store
        .messages_in(&conversation.id)
        .await
        .expect("Failed to list messages");
    assert!(messages.iter().all(|m| m.is_read));

    let participants = store
        .participants_of(&conversation.id)
        .await
        .expect("Failed to list participants");
    let b_row = participants
        .iter()
        .find(|p| p.user_id == "b")
        .expect("Participant missing");
    assert!(b_row.last_read_at.is_some());

    service
        .mark_read(&conversation.id, &b)
        .await
        .expect("Failed to mark read again");

    let after = store
        .messages_in(&conversation.id)
        .await
        .expect("Failed to list messages");
    assert!(after.iter().all(|m| m.is_read));
}

/// **Test: list_messages enriches senders and surfaces NotFound.**
///
/// **Setup:** Profile seeded for "a"; direct conversation with one message from "a".
/// **Action:** `list_messages(conversation)` and `list_messages("missing")`.
/// **Expected:** One message with the sender profile resolved; unknown id
/// yields `MessagingError::NotFound`.
#[tokio::test]
async fn test_list_messages_enrichment_and_not_found() {
    let (service, store) = new_service().await;
    let a = identity("a");

    store
        .upsert_profile(&Profile {
            user_id: "a".to_string(),
            first_name: Some("Anna".to_string()),
            last_name: Some("de Vries".to_string()),
            avatar_url: None,
        })
        .await
        .expect("Failed to upsert profile");

    let conversation = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    service
        .send_message(&conversation.id, &a, "  spacing preserved  ")
        .await
        .expect("Failed to send message");

    let messages = service
        .list_messages(&conversation.id)
        .await
        .expect("Failed to list messages");
    assert_eq!(messages.len(), 1);
    // Body persisted verbatim; trimming is the UI's concern.
    assert_eq!(messages[0].message.body, "  spacing preserved  ");
    let sender = messages[0].sender.as_ref().expect("Sender profile missing");
    assert_eq!(sender.display_name(), "Anna de Vries");

    let missing = service.list_messages("missing").await;
    assert!(matches!(missing, Err(MessagingError::NotFound(_))));

    let missing = service.mark_read("missing", &a).await;
    assert!(matches!(missing, Err(MessagingError::NotFound(_))));
}

/// **Test: End-to-end first-contact flow.**
///
/// **Setup:** Empty store.
/// **Action:** "a" creates a direct conversation with "b" and sends "Hello";
/// "b" lists, marks read, lists again.
/// **Expected:** One direct conversation, two participants (a owner, b
/// participant), one unread message for "b" which drops to zero after
/// mark_read; "b"'s last_read_at is set.
#[tokio::test]
async fn test_first_contact_end_to_end() {
    let (service, store) = new_service().await;
    let a = identity("a");
    let b = identity("b");

    let conversation = service
        .create_conversation(&a, &["b".to_string()], ConversationType::Direct, None, None)
        .await
        .expect("Failed to create conversation");
    assert_eq!(conversation.conversation_type, ConversationType::Direct);

    service
        .send_message(&conversation.id, &a, "Hello")
        .await
        .expect("Failed to send message");

    let participants = store
        .participants_of(&conversation.id)
        .await
        .expect("Failed to list participants");
    assert_eq!(participants.len(), 2);

    let listed = service
        .list_conversations(&b)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].unread_count, 1);
    let last = listed[0].last_message.as_ref().expect("Last message missing");
    assert_eq!(last.body, "Hello");
    assert_eq!(last.sender_id, "a");
    assert!(!last.is_read);

    service
        .mark_read(&conversation.id, &b)
        .await
        .expect("Failed to mark read");

    let listed = service
        .list_conversations(&b)
        .await
        .expect("Failed to list conversations");
    assert_eq!(listed[0].unread_count, 0);
    let last = listed[0].last_message.as_ref().expect("Last message missing");
    assert!(last.is_read);
}
