// db/chatdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

use super::DBClient;
use crate::models::chatmodel::*;

const CHAT_COLUMNS: &str = "id, contact_name, contact_number, contact_profile_pic, assigned_to, \
     status, category, last_message, last_message_time, unread_count, is_important, created_at";

#[async_trait]
pub trait ChatExt {
    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error>;

    async fn get_chat_by_number(&self, number: &str) -> Result<Option<Chat>, Error>;

    /// Sorted by last message time, newest first.
    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, Error>;

    /// Idempotent on `contact.number`. The flag is true when this call
    /// created the chat.
    async fn create_or_get_chat(&self, chat: NewChat) -> Result<(Chat, bool), Error>;

    async fn update_chat(&self, chat_id: Uuid, update: &ChatUpdate) -> Result<Option<Chat>, Error>;

    async fn set_last_message(
        &self,
        chat_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Chat>, Error>;

    /// Recomputes `unread_count` from the unread contact messages of the chat.
    async fn recompute_unread_count(&self, chat_id: Uuid) -> Result<Option<Chat>, Error>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = $1"))
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_chat_by_number(&self, number: &str) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!(
            "SELECT {CHAT_COLUMNS} FROM chats WHERE contact_number = $1"
        ))
        .bind(number)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chats
            WHERE ($1::chat_category IS NULL OR category = $1)
              AND ($2::chat_status IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR assigned_to = $3)
            ORDER BY last_message_time DESC
            "#
        ))
        .bind(filter.category)
        .bind(filter.status)
        .bind(filter.assigned_to)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_or_get_chat(&self, chat: NewChat) -> Result<(Chat, bool), Error> {
        let inserted = sqlx::query_as::<_, Chat>(&format!(
            r#"
            INSERT INTO chats (id, contact_name, contact_number, contact_profile_pic,
                               assigned_to, status, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (contact_number) DO NOTHING
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&chat.contact.name)
        .bind(&chat.contact.number)
        .bind(&chat.contact.profile_pic)
        .bind(chat.assigned_to)
        .bind(chat.status)
        .bind(chat.category)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(created) = inserted {
            return Ok((created, true));
        }

        let existing = self
            .get_chat_by_number(&chat.contact.number)
            .await?
            .ok_or(Error::RowNotFound)?;

        Ok((existing, false))
    }

    async fn update_chat(&self, chat_id: Uuid, update: &ChatUpdate) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET assigned_to = CASE WHEN $2 THEN $3 ELSE assigned_to END,
                status = COALESCE($4, status),
                category = COALESCE($5, category),
                is_important = COALESCE($6, is_important)
            WHERE id = $1
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .bind(update.assigned_to.is_some())
        .bind(update.assigned_to.flatten())
        .bind(update.status)
        .bind(update.category)
        .bind(update.is_important)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_last_message(
        &self,
        chat_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET last_message = $2, last_message_time = $3
            WHERE id = $1
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .bind(content)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
    }

    async fn recompute_unread_count(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        sqlx::query_as::<_, Chat>(&format!(
            r#"
            UPDATE chats
            SET unread_count = (
                SELECT COUNT(*)::int
                FROM messages
                WHERE chat_id = $1 AND sender = 'contact' AND is_read = FALSE
            )
            WHERE id = $1
            RETURNING {CHAT_COLUMNS}
            "#
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await
    }
}
