// dtos/chatdtos.rs
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::userdtos::UserSummaryDto,
    models::{
        chatmodel::{Chat, ChatCategory, ChatStatus, Contact},
        usermodel::User,
    },
};

/// Distinguishes an absent field from an explicit `null`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChatListQueryDto {
    pub category: Option<String>,
    pub status: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    #[validate(length(min = 1, message = "Contact name is required"))]
    pub name: String,

    #[validate(length(min = 1, message = "Contact number is required"))]
    pub number: String,

    pub profile_pic: Option<String>,
}

impl ContactDto {
    pub fn into_contact(self) -> Contact {
        Contact {
            name: self.name.trim().to_string(),
            number: self.number.trim().to_string(),
            profile_pic: self.profile_pic.unwrap_or_default(),
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatDto {
    #[validate]
    pub contact: ContactDto,
    pub assigned_to: Option<Uuid>,
    pub status: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChatDto {
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<Uuid>>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub is_important: Option<bool>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignChatDto {
    pub user_id: Option<Uuid>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ChatStatusDto {
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportantDto {
    pub is_important: bool,
}

/// A chat with its assignee populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponseDto {
    pub id: Uuid,
    pub contact: Contact,
    pub assigned_to: Option<UserSummaryDto>,
    pub status: ChatStatus,
    pub category: ChatCategory,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i32,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatResponseDto {
    pub fn from_chat(chat: Chat, assignee: Option<&User>) -> Self {
        ChatResponseDto {
            id: chat.id,
            contact: chat.contact,
            assigned_to: assignee.map(UserSummaryDto::with_status),
            status: chat.status,
            category: chat.category,
            last_message: chat.last_message,
            last_message_time: chat.last_message_time,
            unread_count: chat.unread_count,
            is_important: chat.is_important,
            created_at: chat.created_at,
        }
    }

    pub fn from_chats(chats: Vec<Chat>, users: &[User]) -> Vec<Self> {
        let by_id: HashMap<Uuid, &User> = users.iter().map(|user| (user.id, user)).collect();
        chats
            .into_iter()
            .map(|chat| {
                let assignee = chat.assigned_to.and_then(|id| by_id.get(&id).copied());
                ChatResponseDto::from_chat(chat, assignee)
            })
            .collect()
    }
}
