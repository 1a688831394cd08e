// models/chatmodel.rs
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "chat_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatStatus {
    Open,
    Closed,
    Paused,
    Snoozed,
    #[default]
    Unassigned,
}

impl ChatStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ChatStatus::Open => "open",
            ChatStatus::Closed => "closed",
            ChatStatus::Paused => "paused",
            ChatStatus::Snoozed => "snoozed",
            ChatStatus::Unassigned => "unassigned",
        }
    }
}

impl FromStr for ChatStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(ChatStatus::Open),
            "closed" => Ok(ChatStatus::Closed),
            "paused" => Ok(ChatStatus::Paused),
            "snoozed" => Ok(ChatStatus::Snoozed),
            "unassigned" => Ok(ChatStatus::Unassigned),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "chat_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatCategory {
    Inbox,
    Mine,
    #[default]
    Unassigned,
    Team,
}

impl ChatCategory {
    pub fn to_str(&self) -> &str {
        match self {
            ChatCategory::Inbox => "inbox",
            ChatCategory::Mine => "mine",
            ChatCategory::Unassigned => "unassigned",
            ChatCategory::Team => "team",
        }
    }
}

impl FromStr for ChatCategory {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inbox" => Ok(ChatCategory::Inbox),
            "mine" => Ok(ChatCategory::Mine),
            "unassigned" => Ok(ChatCategory::Unassigned),
            "team" => Ok(ChatCategory::Team),
            other => Err(format!("Invalid category: {}", other)),
        }
    }
}

/// WhatsApp contact a chat belongs to. `number` is the natural key.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[sqlx(rename = "contact_name")]
    pub name: String,
    #[sqlx(rename = "contact_number")]
    pub number: String,
    #[sqlx(rename = "contact_profile_pic")]
    #[serde(default)]
    pub profile_pic: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: Uuid,
    #[sqlx(flatten)]
    pub contact: Contact,
    pub assigned_to: Option<Uuid>,
    pub status: ChatStatus,
    pub category: ChatCategory,
    pub last_message: String,
    pub last_message_time: DateTime<Utc>,
    pub unread_count: i32,
    pub is_important: bool,
    pub created_at: DateTime<Utc>,
}

/// Values for a chat that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewChat {
    pub contact: Contact,
    pub assigned_to: Option<Uuid>,
    pub status: ChatStatus,
    pub category: ChatCategory,
}

/// Filter for chat listings. `assigned_to` is set for the "mine" view.
#[derive(Debug, Clone, Default)]
pub struct ChatFilter {
    pub category: Option<ChatCategory>,
    pub status: Option<ChatStatus>,
    pub assigned_to: Option<Uuid>,
}

impl ChatFilter {
    pub fn matches(&self, chat: &Chat) -> bool {
        self.category.map_or(true, |c| chat.category == c)
            && self.status.map_or(true, |s| chat.status == s)
            && self.assigned_to.map_or(true, |u| chat.assigned_to == Some(u))
    }
}

/// Partial update applied by the generic chat update path.
/// `assigned_to` is tri-state: untouched, cleared, or set.
#[derive(Debug, Clone, Default)]
pub struct ChatUpdate {
    pub assigned_to: Option<Option<Uuid>>,
    pub status: Option<ChatStatus>,
    pub category: Option<ChatCategory>,
    pub is_important: Option<bool>,
}

impl ChatUpdate {
    pub fn apply(&self, chat: &mut Chat) {
        if let Some(assigned_to) = self.assigned_to {
            chat.assigned_to = assigned_to;
        }
        if let Some(status) = self.status {
            chat.status = status;
        }
        if let Some(category) = self.category {
            chat.category = category;
        }
        if let Some(is_important) = self.is_important {
            chat.is_important = is_important;
        }
    }
}
