// db/messagedb.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{types::Json, Error};
use uuid::Uuid;

use super::DBClient;
use crate::models::messagemodel::*;

const MESSAGE_COLUMNS: &str =
    "id, chat_id, sender, user_id, content, media_url, media_type, is_read, timestamp, comments";

#[async_trait]
pub trait MessageExt {
    async fn save_message(&self, message: NewMessage) -> Result<Message, Error>;

    /// Oldest first.
    async fn get_chat_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error>;

    async fn mark_message_read(&self, message_id: Uuid) -> Result<Option<Message>, Error>;

    async fn add_comment(
        &self,
        message_id: Uuid,
        comment: Comment,
    ) -> Result<Option<Message>, Error>;
}

#[async_trait]
impl MessageExt for DBClient {
    async fn save_message(&self, message: NewMessage) -> Result<Message, Error> {
        let (media_url, media_type) = match message.media {
            Some(media) => (Some(media.url), media.media_type),
            None => (None, None),
        };

        sqlx::query_as::<_, Message>(&format!(
            r#"
            INSERT INTO messages (id, chat_id, sender, user_id, content, media_url, media_type,
                                  is_read, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(message.chat_id)
        .bind(message.sender)
        .bind(message.user_id)
        .bind(message.content)
        .bind(media_url)
        .bind(media_type)
        .bind(message.is_read)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_chat_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = $1 ORDER BY timestamp ASC"
        ))
        .bind(chat_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn mark_message_read(&self, message_id: Uuid) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "UPDATE messages SET is_read = TRUE WHERE id = $1 RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn add_comment(
        &self,
        message_id: Uuid,
        comment: Comment,
    ) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            r#"
            UPDATE messages
            SET comments = comments || $2
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message_id)
        .bind(Json(vec![comment]))
        .fetch_optional(&self.pool)
        .await
    }
}
