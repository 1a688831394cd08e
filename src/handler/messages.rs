// handler/messages.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{ChatExt, MessageExt, UserExt},
    dtos::messagedtos::{CommentDto, MessageResponseDto, SendMessageDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::messagemodel::{Comment, Message},
    service::{error::ServiceError, sync_service::MessageEvent},
    AppState,
};

pub fn messages_handler() -> Router {
    Router::new()
        .route("/", post(send_message))
        .route("/chat/:chat_id", get(get_chat_messages))
        .route("/:id/comment", post(add_comment))
        .route("/:id/read", patch(mark_as_read))
}

async fn populate_messages(
    app_state: &AppState,
    messages: Vec<Message>,
) -> Result<Vec<MessageResponseDto>, HttpError> {
    let user_ids = MessageResponseDto::referenced_users(&messages);
    let users = app_state
        .db_client
        .get_users_by_ids(&user_ids)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(MessageResponseDto::populate_all(messages, &users))
}

async fn populate_message(
    app_state: &AppState,
    message: Message,
) -> Result<MessageResponseDto, HttpError> {
    let user_ids = MessageResponseDto::referenced_users(std::slice::from_ref(&message));
    let users = app_state
        .db_client
        .get_users_by_ids(&user_ids)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(MessageResponseDto::populate(message, &users))
}

pub async fn get_chat_messages(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let messages = app_state
        .db_client
        .get_chat_messages(chat_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(populate_messages(&app_state, messages).await?))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    let event = MessageEvent::from_rest(
        body.chat_id,
        actor.user.id,
        body.content.as_deref(),
        body.media_url,
        body.media_type,
    );

    let outcome = app_state.sync_service.ingest(event).await.map_err(|e| {
        tracing::error!(chat_id = %body.chat_id, error = %e, "Failed to send message");
        HttpError::from(e)
    })?;

    // the stored placeholder never goes out to the contact
    if let Some(text) = body.content.filter(|text| !text.trim().is_empty()) {
        app_state
            .sync_service
            .spawn_outbound(outcome.chat.contact.number.clone(), text);
    }

    Ok((
        StatusCode::CREATED,
        Json(populate_message(&app_state, outcome.message).await?),
    ))
}

pub async fn add_comment(
    Path(message_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
    Json(body): Json<CommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let content = body.content.trim();
    if content.is_empty() {
        return Err(HttpError::bad_request("Comment content is required"));
    }

    let comment = Comment {
        user_id: actor.user.id,
        content: content.to_string(),
        timestamp: Utc::now(),
    };

    let message = app_state
        .db_client
        .add_comment(message_id, comment)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(ServiceError::MessageNotFound(message_id))?;

    Ok(Json(populate_message(&app_state, message).await?))
}

pub async fn mark_as_read(
    Path(message_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .db_client
        .mark_message_read(message_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(ServiceError::MessageNotFound(message_id))?;

    let chat = app_state
        .db_client
        .recompute_unread_count(message.chat_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if let Some(chat) = chat {
        tracing::debug!(chat_id = %chat.id, unread_count = chat.unread_count, "Unread count recomputed");
    }

    Ok(Json(populate_message(&app_state, message).await?))
}
