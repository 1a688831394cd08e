// models/messagemodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "message_sender", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Contact,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "media_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub user_id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub url: String,
    pub media_type: Option<MediaType>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender: MessageSender,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
    pub comments: Json<Vec<Comment>>,
}

/// A message about to be persisted. Content is already defaulted.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub chat_id: Uuid,
    pub sender: MessageSender,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub media: Option<Media>,
    pub is_read: bool,
}
