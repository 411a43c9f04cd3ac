//! Core types: conversation, participant, platform message, profile, recipient
//! selector, and the enriched per-viewer views computed at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of conversation channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationType {
    Direct,
    Group,
    Support,
}

impl ConversationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Group => "group",
            Self::Support => "support",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(Self::Direct),
            "group" => Some(Self::Group),
            "support" => Some(Self::Support),
            _ => None,
        }
    }
}

/// Role of a user inside a conversation. The creator is always `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    Owner,
    Participant,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Participant => "participant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(Self::Owner),
            "participant" => Some(Self::Participant),
            _ => None,
        }
    }
}

/// Kind of platform message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    System,
    Notification,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::System => "system",
            Self::Notification => "notification",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "system" => Some(Self::System),
            "notification" => Some(Self::Notification),
            _ => None,
        }
    }
}

/// Delivery priority; broadcasts may be `Urgent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Normal,
    Urgent,
}

impl MessagePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "urgent" => Some(Self::Urgent),
            _ => None,
        }
    }
}

/// A conversation channel: direct, group, or support.
///
/// `last_message_at` is refreshed by the storage layer as a side effect of
/// message insertion, never by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub conversation_type: ConversationType,
    pub title: Option<String>,
    /// Optional link to an external entity (e.g. a care case).
    pub context_type: Option<String>,
    pub context_id: Option<String>,
    pub is_broadcast: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates a new conversation with a generated UUID and current timestamps.
    pub fn new(
        conversation_type: ConversationType,
        title: Option<String>,
        context_type: Option<String>,
        context_id: Option<String>,
        is_broadcast: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_type,
            title,
            context_type,
            context_id,
            is_broadcast,
            last_message_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Most recent activity instant, falling back to creation time for
    /// conversations with no messages yet. Used for list ordering.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

/// A user's membership record in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationParticipant {
    pub conversation_id: String,
    pub user_id: String,
    pub role: ParticipantRole,
    pub joined_at: DateTime<Utc>,
    /// "Caught up as of this instant"; `None` means the user never opened it.
    pub last_read_at: Option<DateTime<Utc>>,
    pub notify: bool,
}

impl ConversationParticipant {
    pub fn new(conversation_id: &str, user_id: &str, role: ParticipantRole) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
            last_read_at: None,
            notify: true,
        }
    }
}

/// A single message in a conversation. Immutable after creation except for
/// the `is_read` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub kind: MessageKind,
    /// Ordered opaque attachment descriptors; this module never inspects them.
    pub attachments: Vec<serde_json::Value>,
    pub is_read: bool,
    pub priority: MessagePriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlatformMessage {
    /// Creates an unread message with a generated UUID and current timestamps.
    pub fn new(
        conversation_id: &str,
        sender_id: &str,
        body: &str,
        kind: MessageKind,
        priority: MessagePriority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            body: body.to_string(),
            kind,
            attachments: Vec::new(),
            is_read: false,
            priority,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Display profile of a user, resolved from the read-only `profiles` lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl Profile {
    /// "First Last", falling back to whichever part exists, then the user id.
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.user_id.clone(),
        }
    }
}

/// A participant together with their resolved display profile.
/// `profile` is `None` when the lookup table has no row for the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub participant: ConversationParticipant,
    pub profile: Option<Profile>,
}

/// Per-viewer view of a conversation computed at read time: participants with
/// profiles, the most recent message (absent for empty conversations), and
/// the viewer's unread count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedConversation {
    pub conversation: Conversation,
    pub participants: Vec<ParticipantProfile>,
    pub last_message: Option<PlatformMessage>,
    pub unread_count: i64,
}

/// A message together with the sender's resolved display profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedMessage {
    pub message: PlatformMessage,
    pub sender: Option<Profile>,
}

/// A recipient-group selector, resolved to concrete user ids only at send
/// time: everyone holding a role, or everyone on staff at a facility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecipientSelector {
    Role { role: String },
    Facility { facility_id: String },
}

impl RecipientSelector {
    pub fn role(role: &str) -> Self {
        Self::Role {
            role: role.to_string(),
        }
    }

    pub fn facility(facility_id: &str) -> Self {
        Self::Facility {
            facility_id: facility_id.to_string(),
        }
    }

    /// Parses a UI selection token (`role_<name>` or `facility_<id>`).
    /// This is the only place the token form is understood; everything past
    /// this boundary works with the tagged variant.
    pub fn parse(token: &str) -> Option<Self> {
        if let Some(role) = token.strip_prefix("role_") {
            if role.is_empty() {
                return None;
            }
            return Some(Self::role(role));
        }
        if let Some(facility_id) = token.strip_prefix("facility_") {
            if facility_id.is_empty() {
                return None;
            }
            return Some(Self::facility(facility_id));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse_role() {
        assert_eq!(
            RecipientSelector::parse("role_nurse"),
            Some(RecipientSelector::role("nurse"))
        );
    }

    #[test]
    fn test_selector_parse_facility() {
        assert_eq!(
            RecipientSelector::parse("facility_f-12"),
            Some(RecipientSelector::facility("f-12"))
        );
    }

    #[test]
    fn test_selector_parse_rejects_unknown_and_empty() {
        assert_eq!(RecipientSelector::parse("team_alpha"), None);
        assert_eq!(RecipientSelector::parse("role_"), None);
        assert_eq!(RecipientSelector::parse("facility_"), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut profile = Profile {
            user_id: "u1".to_string(),
            first_name: Some("Anna".to_string()),
            last_name: Some("de Vries".to_string()),
            avatar_url: None,
        };
        assert_eq!(profile.display_name(), "Anna de Vries");

        profile.last_name = None;
        assert_eq!(profile.display_name(), "Anna");

        profile.first_name = None;
        assert_eq!(profile.display_name(), "u1");
    }

    #[test]
    fn test_activity_at_falls_back_to_created() {
        let conversation =
            Conversation::new(ConversationType::Group, None, None, None, false);
        assert_eq!(conversation.activity_at(), conversation.created_at);
    }
}
