//! Row model for the `platform_messages` table.
//!
//! Attachments are stored as a JSON array column; descriptors stay opaque.

use chrono::{DateTime, Utc};

use careline_core::{MessageKind, MessagePriority, PlatformMessage};

use crate::error::StorageError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub message_type: String,
    pub attachments: String,
    pub is_read: bool,
    pub priority: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageRow {
    pub fn into_core(self) -> Result<PlatformMessage, StorageError> {
        let kind = MessageKind::parse(&self.message_type).ok_or_else(|| {
            StorageError::Database(format!(
                "Unknown message_type '{}' for message {}",
                self.message_type, self.id
            ))
        })?;
        let priority = MessagePriority::parse(&self.priority).ok_or_else(|| {
            StorageError::Database(format!(
                "Unknown priority '{}' for message {}",
                self.priority, self.id
            ))
        })?;
        let attachments: Vec<serde_json::Value> =
            serde_json::from_str(&self.attachments).map_err(|e| {
                StorageError::Database(format!(
                    "Invalid attachments JSON for message {}: {}",
                    self.id, e
                ))
            })?;
        Ok(PlatformMessage {
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            body: self.body,
            kind,
            attachments,
            is_read: self.is_read,
            priority,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
