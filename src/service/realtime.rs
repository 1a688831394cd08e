//! Realtime fan-out.
//!
//! Every socket connection registers here and gets its own unbounded queue,
//! so delivery order per connection is the order events were published.
//! Rooms are named by chat id; any connection may join any room.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::models::messagemodel::Message;

pub type ConnectionId = Uuid;

/// Server to client frames, `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    NewMessage {
        #[serde(rename = "chatId")]
        chat_id: Uuid,
        message: Message,
    },
    ReceiveMessage(Message),
    MessageError {
        error: String,
    },
}

/// Client to server frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    JoinChat(String),
    LeaveChat(String),
    SendMessage(SocketSendPayload),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketSendPayload {
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub message: Option<SocketMessageBody>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

/// The `message` field arrives either as plain text or as `{content}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SocketMessageBody {
    Text(String),
    Object {
        #[serde(default)]
        content: Option<String>,
    },
    Other(serde_json::Value),
}

impl SocketMessageBody {
    pub fn content(&self) -> Option<&str> {
        match self {
            SocketMessageBody::Text(text) => Some(text.as_str()),
            SocketMessageBody::Object { content } => content.as_deref(),
            SocketMessageBody::Other(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct HubState {
    connections: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
    rooms: HashMap<String, HashSet<ConnectionId>>,
}

#[derive(Debug, Default)]
pub struct RealtimeHub {
    state: RwLock<HubState>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.state.write().await.connections.insert(id, tx);
        tracing::info!(connection_id = %id, "Realtime client connected");
        (id, rx)
    }

    pub async fn disconnect(&self, id: ConnectionId) {
        let mut state = self.state.write().await;
        state.connections.remove(&id);
        state.rooms.retain(|_, members| {
            members.remove(&id);
            !members.is_empty()
        });
        tracing::info!(connection_id = %id, "Realtime client disconnected");
    }

    pub async fn join(&self, id: ConnectionId, room: &str) {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(&id) {
            return;
        }
        state.rooms.entry(room.to_string()).or_default().insert(id);
        tracing::debug!(connection_id = %id, room, "Joined chat room");
    }

    pub async fn leave(&self, id: ConnectionId, room: &str) {
        let mut state = self.state.write().await;
        if let Some(members) = state.rooms.get_mut(room) {
            members.remove(&id);
            if members.is_empty() {
                state.rooms.remove(room);
            }
        }
    }

    /// Sends to every connection. Returns how many queues accepted the event.
    pub async fn broadcast(&self, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        state
            .connections
            .values()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    pub async fn emit_to_room(&self, room: &str, event: ServerEvent) -> usize {
        let state = self.state.read().await;
        let Some(members) = state.rooms.get(room) else {
            return 0;
        };

        members
            .iter()
            .filter_map(|id| state.connections.get(id))
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    pub async fn emit_to(&self, id: ConnectionId, event: ServerEvent) -> bool {
        let state = self.state.read().await;
        state
            .connections
            .get(&id)
            .map_or(false, |tx| tx.send(event).is_ok())
    }

    /// `new-message` to everyone, `receive-message` to the chat's room.
    pub async fn publish_message(&self, message: &Message) {
        let delivered = self
            .broadcast(ServerEvent::NewMessage {
                chat_id: message.chat_id,
                message: message.clone(),
            })
            .await;
        let in_room = self
            .emit_to_room(
                &message.chat_id.to_string(),
                ServerEvent::ReceiveMessage(message.clone()),
            )
            .await;

        tracing::debug!(
            chat_id = %message.chat_id,
            message_id = %message.id,
            delivered,
            in_room,
            "Published message"
        );
    }

    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }

    #[cfg(test)]
    pub async fn room_size(&self, room: &str) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room)
            .map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    use crate::models::messagemodel::MessageSender;

    fn message(chat_id: Uuid) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id,
            sender: MessageSender::Contact,
            user_id: None,
            content: "oi".to_string(),
            media_url: None,
            media_type: None,
            is_read: false,
            timestamp: Utc::now(),
            comments: Json(Vec::new()),
        }
    }

    #[tokio::test]
    async fn publish_reaches_everyone_globally_but_only_room_members_for_receive() {
        let hub = RealtimeHub::new();
        let (inside, mut inside_rx) = hub.connect().await;
        let (_outside, mut outside_rx) = hub.connect().await;
        let chat_id = Uuid::new_v4();
        hub.join(inside, &chat_id.to_string()).await;

        hub.publish_message(&message(chat_id)).await;

        assert!(matches!(inside_rx.recv().await, Some(ServerEvent::NewMessage { .. })));
        assert!(matches!(inside_rx.recv().await, Some(ServerEvent::ReceiveMessage(_))));
        assert!(matches!(outside_rx.recv().await, Some(ServerEvent::NewMessage { .. })));
        assert!(outside_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_removes_connection_from_rooms() {
        let hub = RealtimeHub::new();
        let (id, _rx) = hub.connect().await;
        hub.join(id, "room").await;
        assert_eq!(hub.room_size("room").await, 1);

        hub.disconnect(id).await;
        assert_eq!(hub.room_size("room").await, 0);
        assert_eq!(hub.connection_count().await, 0);
        assert!(!hub.emit_to(id, ServerEvent::MessageError { error: "x".into() }).await);
    }

    #[tokio::test]
    async fn leave_stops_room_delivery() {
        let hub = RealtimeHub::new();
        let (id, mut rx) = hub.connect().await;
        hub.join(id, "room").await;
        hub.leave(id, "room").await;

        let sent = hub
            .emit_to_room("room", ServerEvent::MessageError { error: "x".into() })
            .await;
        assert_eq!(sent, 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn server_events_use_event_and_data_fields() {
        let chat_id = Uuid::new_v4();
        let json = serde_json::to_value(ServerEvent::NewMessage {
            chat_id,
            message: message(chat_id),
        })
        .unwrap();
        assert_eq!(json["event"], "new-message");
        assert_eq!(json["data"]["chatId"], chat_id.to_string());
        assert_eq!(json["data"]["message"]["content"], "oi");

        let json = serde_json::to_value(ServerEvent::MessageError { error: "boom".into() }).unwrap();
        assert_eq!(json["event"], "message-error");
        assert_eq!(json["data"]["error"], "boom");
    }

    #[test]
    fn client_message_body_accepts_text_object_and_junk() {
        let text: ClientEvent = serde_json::from_str(
            r#"{"event":"send-message","data":{"chatId":"abc","message":"hi"}}"#,
        )
        .unwrap();
        let object: ClientEvent = serde_json::from_str(
            r#"{"event":"send-message","data":{"chatId":"abc","message":{"content":"hey"}}}"#,
        )
        .unwrap();
        let junk: ClientEvent = serde_json::from_str(
            r#"{"event":"send-message","data":{"chatId":"abc","message":42}}"#,
        )
        .unwrap();

        let content = |event: ClientEvent| match event {
            ClientEvent::SendMessage(payload) => {
                payload.message.and_then(|m| m.content().map(str::to_string))
            }
            _ => panic!("expected send-message"),
        };
        assert_eq!(content(text), Some("hi".to_string()));
        assert_eq!(content(object), Some("hey".to_string()));
        assert_eq!(content(junk), None);

        let join: ClientEvent =
            serde_json::from_str(r#"{"event":"join-chat","data":"room-1"}"#).unwrap();
        assert!(matches!(join, ClientEvent::JoinChat(room) if room == "room-1"));
    }
}
