//! Row model for the `conversations` table.

use chrono::{DateTime, Utc};

use careline_core::{Conversation, ConversationType};

use crate::error::StorageError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ConversationRow {
    pub id: String,
    pub conversation_type: String,
    pub title: Option<String>,
    pub context_type: Option<String>,
    pub context_id: Option<String>,
    pub is_broadcast: bool,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationRow {
    pub fn into_core(self) -> Result<Conversation, StorageError> {
        let conversation_type = ConversationType::parse(&self.conversation_type).ok_or_else(|| {
            StorageError::Database(format!(
                "Unknown conversation_type '{}' for conversation {}",
                self.conversation_type, self.id
            ))
        })?;
        Ok(Conversation {
            id: self.id,
            conversation_type,
            title: self.title,
            context_type: self.context_type,
            context_id: self.context_id,
            is_broadcast: self.is_broadcast,
            last_message_at: self.last_message_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
