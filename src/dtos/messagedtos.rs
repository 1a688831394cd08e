// dtos/messagedtos.rs
use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::userdtos::UserSummaryDto,
    models::{
        messagemodel::{MediaType, Message, MessageSender},
        usermodel::User,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDto {
    pub chat_id: Uuid,
    pub content: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CommentDto {
    #[validate(length(min = 1, message = "Comment content is required"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponseDto {
    pub user_id: Option<UserSummaryDto>,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message with its author and comment authors populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponseDto {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub sender: MessageSender,
    pub user_id: Option<UserSummaryDto>,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
    pub comments: Vec<CommentResponseDto>,
}

impl MessageResponseDto {
    /// Every user id a set of messages points at, authors and commenters.
    pub fn referenced_users(messages: &[Message]) -> Vec<Uuid> {
        let ids: BTreeSet<Uuid> = messages
            .iter()
            .flat_map(|message| {
                message
                    .user_id
                    .into_iter()
                    .chain(message.comments.iter().map(|comment| comment.user_id))
            })
            .collect();
        ids.into_iter().collect()
    }

    pub fn populate(message: Message, users: &[User]) -> Self {
        let by_id: HashMap<Uuid, &User> = users.iter().map(|user| (user.id, user)).collect();
        Self::populate_with(message, &by_id)
    }

    pub fn populate_all(messages: Vec<Message>, users: &[User]) -> Vec<Self> {
        let by_id: HashMap<Uuid, &User> = users.iter().map(|user| (user.id, user)).collect();
        messages
            .into_iter()
            .map(|message| Self::populate_with(message, &by_id))
            .collect()
    }

    fn populate_with(message: Message, users: &HashMap<Uuid, &User>) -> Self {
        let summary = |id: Uuid| users.get(&id).map(|user| UserSummaryDto::without_status(user));

        let comments = message
            .comments
            .0
            .into_iter()
            .map(|comment| CommentResponseDto {
                user_id: summary(comment.user_id),
                content: comment.content,
                timestamp: comment.timestamp,
            })
            .collect();

        MessageResponseDto {
            id: message.id,
            chat_id: message.chat_id,
            sender: message.sender,
            user_id: message.user_id.and_then(summary),
            content: message.content,
            media_url: message.media_url,
            media_type: message.media_type,
            is_read: message.is_read,
            timestamp: message.timestamp,
            comments,
        }
    }
}
