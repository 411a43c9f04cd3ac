//! Row model for the `conversation_participants` table.

use chrono::{DateTime, Utc};

use careline_core::{ConversationParticipant, ParticipantRole};

use crate::error::StorageError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ParticipantRow {
    pub conversation_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub notify: bool,
}

impl ParticipantRow {
    pub fn into_core(self) -> Result<ConversationParticipant, StorageError> {
        let role = ParticipantRole::parse(&self.role).ok_or_else(|| {
            StorageError::Database(format!(
                "Unknown participant role '{}' for user {} in conversation {}",
                self.role, self.user_id, self.conversation_id
            ))
        })?;
        Ok(ConversationParticipant {
            conversation_id: self.conversation_id,
            user_id: self.user_id,
            role,
            joined_at: self.joined_at,
            last_read_at: self.last_read_at,
            notify: self.notify,
        })
    }
}
