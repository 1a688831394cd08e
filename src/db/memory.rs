// db/memory.rs
//! In-process store used when no `DATABASE_URL` is configured, and by tests.
//! Mirrors the PostgreSQL semantics, including the unique contact number.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, Error};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ChatExt, InboxStore, MessageExt, UserExt};
use crate::{
    db::userdb::UserProfileUpdate,
    models::{
        chatmodel::{Chat, ChatFilter, ChatUpdate, NewChat},
        messagemodel::{Comment, Message, MessageSender, NewMessage},
        usermodel::{User, UserRole, UserStatus},
    },
};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    chats: HashMap<Uuid, Chat>,
    // insertion order breaks timestamp ties
    messages: Vec<Message>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InboxStore for MemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, Error> {
        let inner = self.inner.read().await;
        if let Some(user_id) = user_id {
            return Ok(inner.users.get(&user_id).cloned());
        }
        if let Some(email) = email {
            return Ok(inner.users.values().find(|u| u.email == email).cloned());
        }
        Ok(None)
    }

    async fn get_users(&self) -> Result<Vec<User>, Error> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, Error> {
        let inner = self.inner.read().await;
        Ok(user_ids
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect())
    }

    async fn save_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, Error> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == email) {
            return Err(Error::Protocol(format!("duplicate email: {}", email)));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            avatar: String::new(),
            role,
            status: UserStatus::default(),
            created_at: Utc::now(),
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        user_id: Uuid,
        update: &UserProfileUpdate,
    ) -> Result<Option<User>, Error> {
        let mut inner = self.inner.write().await;
        if let Some(email) = &update.email {
            if inner.users.values().any(|u| &u.email == email && u.id != user_id) {
                return Err(Error::Protocol(format!("duplicate email: {}", email)));
            }
        }

        Ok(inner.users.get_mut(&user_id).map(|user| {
            update.apply(user);
            user.clone()
        }))
    }

    async fn update_user_status(
        &self,
        user_id: Uuid,
        status: UserStatus,
    ) -> Result<Option<User>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&user_id).map(|user| {
            user.status = status;
            user.clone()
        }))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<bool, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.remove(&user_id).is_some())
    }
}

#[async_trait]
impl ChatExt for MemoryStore {
    async fn get_chat_by_id(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        Ok(self.inner.read().await.chats.get(&chat_id).cloned())
    }

    async fn get_chat_by_number(&self, number: &str) -> Result<Option<Chat>, Error> {
        let inner = self.inner.read().await;
        Ok(inner
            .chats
            .values()
            .find(|c| c.contact.number == number)
            .cloned())
    }

    async fn get_chats(&self, filter: &ChatFilter) -> Result<Vec<Chat>, Error> {
        let inner = self.inner.read().await;
        let mut chats: Vec<Chat> = inner
            .chats
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        chats.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(chats)
    }

    async fn create_or_get_chat(&self, chat: NewChat) -> Result<(Chat, bool), Error> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .chats
            .values()
            .find(|c| c.contact.number == chat.contact.number)
        {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let created = Chat {
            id: Uuid::new_v4(),
            contact: chat.contact,
            assigned_to: chat.assigned_to,
            status: chat.status,
            category: chat.category,
            last_message: String::new(),
            last_message_time: now,
            unread_count: 0,
            is_important: false,
            created_at: now,
        };
        inner.chats.insert(created.id, created.clone());
        Ok((created, true))
    }

    async fn update_chat(&self, chat_id: Uuid, update: &ChatUpdate) -> Result<Option<Chat>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.chats.get_mut(&chat_id).map(|chat| {
            update.apply(chat);
            chat.clone()
        }))
    }

    async fn set_last_message(
        &self,
        chat_id: Uuid,
        content: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Chat>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.chats.get_mut(&chat_id).map(|chat| {
            chat.last_message = content.to_string();
            chat.last_message_time = at;
            chat.clone()
        }))
    }

    async fn recompute_unread_count(&self, chat_id: Uuid) -> Result<Option<Chat>, Error> {
        let mut inner = self.inner.write().await;
        let unread = inner
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id && m.sender == MessageSender::Contact && !m.is_read)
            .count() as i32;

        Ok(inner.chats.get_mut(&chat_id).map(|chat| {
            chat.unread_count = unread;
            chat.clone()
        }))
    }
}

#[async_trait]
impl MessageExt for MemoryStore {
    async fn save_message(&self, message: NewMessage) -> Result<Message, Error> {
        let mut inner = self.inner.write().await;
        if !inner.chats.contains_key(&message.chat_id) {
            return Err(Error::RowNotFound);
        }

        let (media_url, media_type) = match message.media {
            Some(media) => (Some(media.url), media.media_type),
            None => (None, None),
        };

        let saved = Message {
            id: Uuid::new_v4(),
            chat_id: message.chat_id,
            sender: message.sender,
            user_id: message.user_id,
            content: message.content,
            media_url,
            media_type,
            is_read: message.is_read,
            timestamp: Utc::now(),
            comments: Json(Vec::new()),
        };
        inner.messages.push(saved.clone());
        Ok(saved)
    }

    async fn get_chat_messages(&self, chat_id: Uuid) -> Result<Vec<Message>, Error> {
        let inner = self.inner.read().await;
        let mut messages: Vec<Message> = inner
            .messages
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.timestamp);
        Ok(messages)
    }

    async fn mark_message_read(&self, message_id: Uuid) -> Result<Option<Message>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.messages.iter_mut().find(|m| m.id == message_id).map(|message| {
            message.is_read = true;
            message.clone()
        }))
    }

    async fn add_comment(
        &self,
        message_id: Uuid,
        comment: Comment,
    ) -> Result<Option<Message>, Error> {
        let mut inner = self.inner.write().await;
        Ok(inner.messages.iter_mut().find(|m| m.id == message_id).map(|message| {
            message.comments.0.push(comment);
            message.clone()
        }))
    }
}
