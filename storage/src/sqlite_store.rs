//! SQLite implementation of [`MessagingStore`].
//!
//! Uses SqlitePoolManager and the row models. Change events are published on
//! a broadcast channel after each successful write, standing in for the
//! hosted backend's realtime feed. `last_message_at` is refreshed inside
//! `insert_message`, standing in for the backend's trigger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::info;

use careline_core::{Conversation, ConversationParticipant, PlatformMessage, Profile};

use crate::error::StorageError;
use crate::events::{ChangeEvent, ChangeOp, ChangeTable};
use crate::models::{ConversationRow, MessageRow, ParticipantRow, ProfileRow};
use crate::sqlite_pool::SqlitePoolManager;
use crate::store::MessagingStore;

const CHANGE_CHANNEL_CAPACITY: usize = 128;

#[derive(Clone)]
pub struct SqliteStore {
    pool_manager: SqlitePoolManager,
    changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
    /// Opens (or creates) the database and ensures the schema exists.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let store = Self {
            pool_manager,
            changes,
        };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        info!("Creating database tables if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                conversation_type TEXT NOT NULL,
                title TEXT,
                context_type TEXT,
                context_id TEXT,
                is_broadcast INTEGER NOT NULL DEFAULT 0,
                last_message_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_participants (
                conversation_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                joined_at TEXT NOT NULL,
                last_read_at TEXT,
                notify INTEGER NOT NULL DEFAULT 1,
                UNIQUE(conversation_id, user_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS platform_messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                body TEXT NOT NULL,
                message_type TEXT NOT NULL,
                attachments TEXT NOT NULL DEFAULT '[]',
                is_read INTEGER NOT NULL DEFAULT 0,
                priority TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                first_name TEXT,
                last_name TEXT,
                avatar_url TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_roles (
                user_id TEXT NOT NULL,
                role TEXT NOT NULL,
                UNIQUE(user_id, role)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS facility_staff (
                facility_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                UNIQUE(facility_id, user_id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        for index in [
            "CREATE INDEX IF NOT EXISTS idx_participants_user_id ON conversation_participants(user_id)",
            "CREATE INDEX IF NOT EXISTS idx_participants_conversation_id ON conversation_participants(conversation_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_conversation_id ON platform_messages(conversation_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_created_at ON platform_messages(created_at)",
            "CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles(role)",
            "CREATE INDEX IF NOT EXISTS idx_facility_staff_facility_id ON facility_staff(facility_id)",
        ] {
            sqlx::query(index).execute(pool).await?;
        }

        info!("Database tables created successfully");
        Ok(())
    }

    /// Best-effort publish; send only fails when nobody is subscribed.
    fn publish(&self, table: ChangeTable, op: ChangeOp) {
        let _ = self.changes.send(ChangeEvent::new(table, op));
    }
}

#[async_trait]
impl MessagingStore for SqliteStore {
    async fn insert_conversation(&self, conversation: &Conversation) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO conversations (id, conversation_type, title, context_type, context_id, is_broadcast, last_message_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&conversation.id)
        .bind(conversation.conversation_type.as_str())
        .bind(&conversation.title)
        .bind(&conversation.context_type)
        .bind(&conversation.context_id)
        .bind(conversation.is_broadcast)
        .bind(conversation.last_message_at)
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .execute(pool)
        .await?;

        info!(
            conversation_id = %conversation.id,
            conversation_type = conversation.conversation_type.as_str(),
            "Saved conversation"
        );
        self.publish(ChangeTable::Conversations, ChangeOp::Insert);
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let pool = self.pool_manager.pool();

        let row: Option<ConversationRow> =
            sqlx::query_as("SELECT * FROM conversations WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        row.map(ConversationRow::into_core).transpose()
    }

    async fn insert_participants(
        &self,
        participants: &[ConversationParticipant],
    ) -> Result<(), StorageError> {
        if participants.is_empty() {
            return Ok(());
        }

        let pool = self.pool_manager.pool();

        for participant in participants {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (conversation_id, user_id, role, joined_at, last_read_at, notify)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&participant.conversation_id)
            .bind(&participant.user_id)
            .bind(participant.role.as_str())
            .bind(participant.joined_at)
            .bind(participant.last_read_at)
            .bind(participant.notify)
            .execute(pool)
            .await?;
        }

        info!(
            conversation_id = %participants[0].conversation_id,
            count = participants.len(),
            "Saved participants"
        );
        self.publish(ChangeTable::ConversationParticipants, ChangeOp::Insert);
        Ok(())
    }

    async fn participants_of(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationParticipant>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<ParticipantRow> = sqlx::query_as(
            "SELECT * FROM conversation_participants WHERE conversation_id = ? ORDER BY joined_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(ParticipantRow::into_core).collect()
    }

    async fn conversation_ids_for_user(&self, user_id: &str) -> Result<Vec<String>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT conversation_id FROM conversation_participants WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn set_last_read(
        &self,
        conversation_id: &str,
        user_id: &str,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            "UPDATE conversation_participants SET last_read_at = ? WHERE conversation_id = ? AND user_id = ?",
        )
        .bind(at)
        .bind(conversation_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        self.publish(ChangeTable::ConversationParticipants, ChangeOp::Update);
        Ok(())
    }

    async fn insert_message(&self, message: &PlatformMessage) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        let attachments = serde_json::to_string(&message.attachments)
            .map_err(|e| StorageError::Database(format!("Attachments serialization: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO platform_messages (id, conversation_id, sender_id, body, message_type, attachments, is_read, priority, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.sender_id)
        .bind(&message.body)
        .bind(message.kind.as_str())
        .bind(attachments)
        .bind(message.is_read)
        .bind(message.priority.as_str())
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(pool)
        .await?;

        // Trigger semantics: the parent conversation's activity timestamp
        // moves with every message insert.
        sqlx::query("UPDATE conversations SET last_message_at = ?, updated_at = ? WHERE id = ?")
            .bind(message.created_at)
            .bind(message.created_at)
            .bind(&message.conversation_id)
            .execute(pool)
            .await?;

        info!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            "Saved message"
        );
        self.publish(ChangeTable::PlatformMessages, ChangeOp::Insert);
        self.publish(ChangeTable::Conversations, ChangeOp::Update);
        Ok(())
    }

    async fn messages_in(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<PlatformMessage>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM platform_messages WHERE conversation_id = ? ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(MessageRow::into_core).collect()
    }

    async fn latest_message(
        &self,
        conversation_id: &str,
    ) -> Result<Option<PlatformMessage>, StorageError> {
        let pool = self.pool_manager.pool();

        let row: Option<MessageRow> = sqlx::query_as(
            "SELECT * FROM platform_messages WHERE conversation_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(conversation_id)
        .fetch_optional(pool)
        .await?;

        row.map(MessageRow::into_core).transpose()
    }

    async fn count_unread_from_others(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<i64, StorageError> {
        let pool = self.pool_manager.pool();

        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM platform_messages WHERE conversation_id = ? AND sender_id != ? AND is_read = 0",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    async fn mark_messages_read(
        &self,
        conversation_id: &str,
        reader_id: &str,
    ) -> Result<u64, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query(
            r#"
            UPDATE platform_messages
            SET is_read = 1, updated_at = ?
            WHERE conversation_id = ? AND sender_id != ? AND is_read = 0
            "#,
        )
        .bind(Utc::now())
        .bind(conversation_id)
        .bind(reader_id)
        .execute(pool)
        .await?;

        let affected = result.rows_affected();
        if affected > 0 {
            self.publish(ChangeTable::PlatformMessages, ChangeOp::Update);
        }
        Ok(affected)
    }

    async fn profiles_by_ids(&self, user_ids: &[String]) -> Result<Vec<Profile>, StorageError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool_manager.pool();

        let placeholders = vec!["?"; user_ids.len()].join(", ");
        let sql = format!("SELECT * FROM profiles WHERE user_id IN ({})", placeholders);

        let mut query = sqlx::query_as::<_, ProfileRow>(&sql);
        for id in user_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(pool).await?;

        Ok(rows.into_iter().map(ProfileRow::into_core).collect())
    }

    async fn user_ids_with_role(&self, role: &str) -> Result<Vec<String>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<(String,)> = sqlx::query_as("SELECT user_id FROM user_roles WHERE role = ?")
            .bind(role)
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn staff_of_facility(&self, facility_id: &str) -> Result<Vec<String>, StorageError> {
        let pool = self.pool_manager.pool();

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT user_id FROM facility_staff WHERE facility_id = ?")
                .bind(facility_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, first_name, last_name, avatar_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET first_name = excluded.first_name, last_name = excluded.last_name, avatar_url = excluded.avatar_url
            "#,
        )
        .bind(&profile.user_id)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.avatar_url)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn grant_role(&self, user_id: &str, role: &str) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
            .bind(user_id)
            .bind(role)
            .execute(pool)
            .await?;

        Ok(())
    }

    async fn add_facility_staff(
        &self,
        facility_id: &str,
        user_id: &str,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query("INSERT OR IGNORE INTO facility_staff (facility_id, user_id) VALUES (?, ?)")
            .bind(facility_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.changes.subscribe()
    }
}
