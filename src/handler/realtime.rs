//! WebSocket endpoint for the agent UI.
//!
//! Frames are JSON `{"event", "data"}` objects. Each connection gets a queue
//! in the [`RealtimeHub`](crate::service::realtime::RealtimeHub); a writer
//! task drains it into the socket while the reader loop handles client events.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::HttpError,
    middleware::authenticate,
    service::{
        realtime::{ClientEvent, ConnectionId, ServerEvent},
        sync_service::MessageEvent,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<SocketQuery>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<Response, HttpError> {
    // anonymous sockets are allowed, a bad token is not
    let user_id = match query.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(token) => Some(authenticate(&app_state, token).await?.id),
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, app_state, user_id)))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>, user_id: Option<Uuid>) {
    let (connection_id, mut events) = app_state.hub.connect().await;
    let (mut sink, mut stream) = socket.split();

    tracing::info!(connection_id = %connection_id, user_id = ?user_id, "Socket connected");

    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode socket event");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_client_frame(&app_state, connection_id, user_id, &text).await
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "Socket read failed");
                break;
            }
        }
    }

    app_state.hub.disconnect(connection_id).await;
    writer.abort();

    tracing::info!(connection_id = %connection_id, "Socket disconnected");
}

/// Applies one client frame. Failures only ever reach the originating connection.
pub async fn handle_client_frame(
    app_state: &AppState,
    connection_id: ConnectionId,
    user_id: Option<Uuid>,
    text: &str,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Ignoring malformed socket frame");
            return;
        }
    };

    match event {
        ClientEvent::JoinChat(chat_id) => {
            app_state.hub.join(connection_id, chat_id.trim()).await;
            tracing::debug!(connection_id = %connection_id, chat_id = %chat_id, "Joined chat room");
        }
        ClientEvent::LeaveChat(chat_id) => {
            app_state.hub.leave(connection_id, chat_id.trim()).await;
        }
        ClientEvent::SendMessage(payload) => {
            let result = match MessageEvent::from_socket(&payload, user_id) {
                Ok(event) => app_state.sync_service.ingest(event).await.map(|_| ()),
                Err(e) => Err(e),
            };

            if let Err(e) = result {
                tracing::warn!(
                    connection_id = %connection_id,
                    chat_id = ?payload.chat_id,
                    error = %e,
                    "Socket message rejected"
                );
                app_state
                    .hub
                    .emit_to(connection_id, ServerEvent::MessageError { error: e.to_string() })
                    .await;
            }
        }
    }
}
