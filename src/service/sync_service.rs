// service/sync_service.rs
//! Chat synchronization core.
//!
//! Every message, whatever its origin, is decoded once into a
//! [`MessageEvent`] and goes through [`ChatSyncService::ingest`]: resolve the
//! chat, persist the message, update the chat aggregate, then fan out.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    db::{ChatExt, InboxStore, MessageExt},
    models::{
        chatmodel::{Chat, ChatCategory, ChatStatus, Contact, NewChat},
        messagemodel::{Media, MediaType, Message, MessageSender, NewMessage},
    },
    service::{
        bridge::{BridgeInboundEvent, WhatsAppBridge},
        chat_state::{assignment_update, classify_media, resolve_content, UNKNOWN_CONTACT_NAME},
        error::ServiceError,
        realtime::{RealtimeHub, SocketSendPayload},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    Bridge,
    Rest { user_id: Uuid },
    Socket { user_id: Option<Uuid> },
}

impl MessageOrigin {
    pub fn sender(&self) -> MessageSender {
        match self {
            MessageOrigin::Bridge => MessageSender::Contact,
            MessageOrigin::Rest { .. } | MessageOrigin::Socket { .. } => MessageSender::User,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            MessageOrigin::Bridge => None,
            MessageOrigin::Rest { user_id } => Some(*user_id),
            MessageOrigin::Socket { user_id } => *user_id,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MessageOrigin::Bridge => "bridge",
            MessageOrigin::Rest { .. } => "rest",
            MessageOrigin::Socket { .. } => "socket",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatRef {
    ByNumber {
        number: String,
        display_name: Option<String>,
    },
    ById(Uuid),
}

/// Canonical message event. `content` is already defaulted.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub origin: MessageOrigin,
    pub chat: ChatRef,
    pub content: String,
    pub media: Option<Media>,
}

impl MessageEvent {
    /// `None` for status broadcasts, group messages and non-message events.
    pub fn from_bridge(event: &BridgeInboundEvent) -> Option<Self> {
        if event.is_ignored() {
            return None;
        }

        let media = event
            .media_data
            .as_ref()
            .filter(|_| event.has_media)
            .and_then(|data| {
                let url = data.media_url.as_deref().filter(|url| !url.is_empty())?;
                let media_type = data
                    .mimetype
                    .as_deref()
                    .or(event.kind.as_deref())
                    .and_then(classify_media);
                Some(Media {
                    url: url.to_string(),
                    media_type,
                })
            });

        Some(MessageEvent {
            origin: MessageOrigin::Bridge,
            chat: ChatRef::ByNumber {
                number: event.from.clone(),
                display_name: event.display_name().map(str::to_string),
            },
            content: resolve_content([event.body.as_deref(), event.kind.as_deref()]),
            media,
        })
    }

    pub fn from_rest(
        chat_id: Uuid,
        user_id: Uuid,
        content: Option<&str>,
        media_url: Option<String>,
        media_type: Option<MediaType>,
    ) -> Self {
        let media = media_url
            .filter(|url| !url.is_empty())
            .map(|url| Media { url, media_type });

        MessageEvent {
            origin: MessageOrigin::Rest { user_id },
            chat: ChatRef::ById(chat_id),
            content: resolve_content([content]),
            media,
        }
    }

    /// `fallback_user` is the socket's authenticated identity, used when the
    /// payload names no user.
    pub fn from_socket(
        payload: &SocketSendPayload,
        fallback_user: Option<Uuid>,
    ) -> Result<Self, ServiceError> {
        let raw_chat_id = payload
            .chat_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ServiceError::MissingChatId)?;
        let chat_id = Uuid::parse_str(raw_chat_id)
            .map_err(|_| ServiceError::InvalidChatId(raw_chat_id.to_string()))?;

        Ok(MessageEvent {
            origin: MessageOrigin::Socket {
                user_id: payload.user_id.or(fallback_user),
            },
            chat: ChatRef::ById(chat_id),
            content: resolve_content([payload.message.as_ref().and_then(|m| m.content())]),
            media: None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub chat: Chat,
    pub message: Message,
    pub chat_created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeIngestStatus {
    Ignored,
    Stored { chat_id: Uuid, message_id: Uuid },
    Failed,
}

impl BridgeIngestStatus {
    pub fn to_str(&self) -> &str {
        match self {
            BridgeIngestStatus::Ignored => "ignored",
            BridgeIngestStatus::Stored { .. } => "stored",
            BridgeIngestStatus::Failed => "failed",
        }
    }
}

/// One async mutex per key, created on demand.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    locks: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // drop entries nobody holds or waits on
            locks.retain(|k, lock| k == key || Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[derive(Debug, Clone)]
pub struct ChatSyncService {
    store: Arc<dyn InboxStore>,
    hub: Arc<RealtimeHub>,
    bridge: Arc<dyn WhatsAppBridge>,
    chat_locks: Arc<KeyedLocks<Uuid>>,
    number_locks: Arc<KeyedLocks<String>>,
}

impl ChatSyncService {
    pub fn new(
        store: Arc<dyn InboxStore>,
        hub: Arc<RealtimeHub>,
        bridge: Arc<dyn WhatsAppBridge>,
    ) -> Self {
        Self {
            store,
            hub,
            bridge,
            chat_locks: Arc::new(KeyedLocks::default()),
            number_locks: Arc::new(KeyedLocks::default()),
        }
    }

    pub async fn ingest(&self, event: MessageEvent) -> Result<SyncOutcome, ServiceError> {
        let (resolved, chat_created) = self.resolve_chat(&event.chat).await?;
        let chat_id = resolved.id;

        let guard = self.chat_locks.acquire(&chat_id).await;

        // re-read under the lock, another handler may have assigned it
        let chat = self
            .store
            .get_chat_by_id(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        let sender = event.origin.sender();
        let message = self
            .store
            .save_message(NewMessage {
                chat_id,
                sender,
                user_id: event.origin.user_id(),
                content: event.content,
                media: event.media,
                is_read: sender == MessageSender::User,
            })
            .await?;

        if let MessageOrigin::Rest { user_id } = event.origin {
            if chat.assigned_to.is_none() {
                self.store
                    .update_chat(chat_id, &assignment_update(Some(user_id)))
                    .await?;
                tracing::info!(chat_id = %chat_id, user_id = %user_id, "Chat auto-assigned to sender");
            }
        }

        self.store
            .set_last_message(chat_id, &message.content, message.timestamp)
            .await?;
        let chat = self
            .store
            .recompute_unread_count(chat_id)
            .await?
            .ok_or(ServiceError::ChatNotFound(chat_id))?;

        drop(guard);

        self.hub.publish_message(&message).await;

        tracing::info!(
            origin = event.origin.label(),
            chat_id = %chat_id,
            message_id = %message.id,
            chat_created,
            unread_count = chat.unread_count,
            "Message synchronized"
        );

        Ok(SyncOutcome {
            chat,
            message,
            chat_created,
        })
    }

    async fn resolve_chat(&self, chat_ref: &ChatRef) -> Result<(Chat, bool), ServiceError> {
        match chat_ref {
            ChatRef::ById(chat_id) => {
                let chat = self
                    .store
                    .get_chat_by_id(*chat_id)
                    .await?
                    .ok_or(ServiceError::ChatNotFound(*chat_id))?;
                Ok((chat, false))
            }
            ChatRef::ByNumber {
                number,
                display_name,
            } => {
                let _guard = self.number_locks.acquire(number).await;

                if let Some(chat) = self.store.get_chat_by_number(number).await? {
                    return Ok((chat, false));
                }

                let name = display_name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(UNKNOWN_CONTACT_NAME);
                let (chat, created) = self
                    .store
                    .create_or_get_chat(NewChat {
                        contact: Contact {
                            name: name.to_string(),
                            number: number.clone(),
                            profile_pic: String::new(),
                        },
                        assigned_to: None,
                        status: ChatStatus::Unassigned,
                        category: ChatCategory::Unassigned,
                    })
                    .await?;

                if created {
                    tracing::info!(chat_id = %chat.id, number = %number, "New chat created for contact");
                }
                Ok((chat, created))
            }
        }
    }

    /// Bridge-originated failures are logged, never surfaced or retried.
    pub async fn ingest_bridge_event(&self, event: &BridgeInboundEvent) -> BridgeIngestStatus {
        let Some(message_event) = MessageEvent::from_bridge(event) else {
            tracing::debug!(
                from = %event.from,
                is_status = event.is_status,
                is_group = event.is_group_msg,
                "Ignoring bridge event"
            );
            return BridgeIngestStatus::Ignored;
        };

        match self.ingest(message_event).await {
            Ok(outcome) => BridgeIngestStatus::Stored {
                chat_id: outcome.chat.id,
                message_id: outcome.message.id,
            },
            Err(e) => {
                tracing::error!(from = %event.from, error = %e, "Failed to store inbound message");
                BridgeIngestStatus::Failed
            }
        }
    }

    /// Best-effort outbound delivery in the background.
    pub fn spawn_outbound(&self, number: String, text: String) -> JoinHandle<()> {
        let bridge = self.bridge.clone();
        tokio::spawn(async move {
            if let Err(e) = bridge.send_text(&number, &text).await {
                tracing::warn!(number = %number, error = %e, "Failed to deliver message through bridge");
            }
        })
    }
}
