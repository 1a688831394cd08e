// handler/chats.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{ChatExt, UserExt},
    dtos::{
        chatdtos::{
            AssignChatDto, ChatListQueryDto, ChatResponseDto, ChatStatusDto, CreateChatDto,
            ImportantDto, UpdateChatDto,
        },
        parse_optional,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::chatmodel::{Chat, ChatCategory, ChatFilter, ChatStatus, ChatUpdate, NewChat},
    service::{
        chat_state::{assignment_state, assignment_update},
        error::ServiceError,
    },
    AppState,
};

pub fn chats_handler() -> Router {
    Router::new()
        .route("/", get(get_chats).post(create_chat))
        .route("/:id", get(get_chat).put(update_chat))
        .route("/:id/assign", patch(assign_chat))
        .route("/:id/status", patch(update_chat_status))
        .route("/:id/important", patch(mark_important))
}

async fn populate_chat(app_state: &AppState, chat: Chat) -> Result<ChatResponseDto, HttpError> {
    let assignee = match chat.assigned_to {
        Some(user_id) => app_state
            .db_client
            .get_user(Some(user_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?,
        None => None,
    };

    Ok(ChatResponseDto::from_chat(chat, assignee.as_ref()))
}

async fn apply_update(
    app_state: &AppState,
    chat_id: Uuid,
    update: &ChatUpdate,
) -> Result<ChatResponseDto, HttpError> {
    let chat = app_state
        .db_client
        .update_chat(chat_id, update)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(ServiceError::ChatNotFound(chat_id))?;

    populate_chat(app_state, chat).await
}

pub async fn get_chats(
    Query(query_params): Query<ChatListQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let category = parse_optional::<ChatCategory>(query_params.category.as_deref())
        .map_err(HttpError::bad_request)?;
    let status = parse_optional::<ChatStatus>(query_params.status.as_deref())
        .map_err(HttpError::bad_request)?;

    let filter = ChatFilter {
        category,
        status,
        assigned_to: (category == Some(ChatCategory::Mine)).then_some(actor.user.id),
    };

    let chats = app_state
        .db_client
        .get_chats(&filter)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut assignee_ids: Vec<Uuid> = chats.iter().filter_map(|chat| chat.assigned_to).collect();
    assignee_ids.sort();
    assignee_ids.dedup();

    let users = app_state
        .db_client
        .get_users_by_ids(&assignee_ids)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(ChatResponseDto::from_chats(chats, &users)))
}

pub async fn get_chat(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let chat = app_state
        .db_client
        .get_chat_by_id(chat_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(ServiceError::ChatNotFound(chat_id))?;

    Ok(Json(populate_chat(&app_state, chat).await?))
}

pub async fn create_chat(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateChatDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (default_status, default_category) = assignment_state(body.assigned_to);
    let status = parse_optional::<ChatStatus>(body.status.as_deref())
        .map_err(HttpError::bad_request)?
        .unwrap_or(default_status);
    let category = parse_optional::<ChatCategory>(body.category.as_deref())
        .map_err(HttpError::bad_request)?
        .unwrap_or(default_category);

    let (chat, created) = app_state
        .db_client
        .create_or_get_chat(NewChat {
            contact: body.contact.into_contact(),
            assigned_to: body.assigned_to,
            status,
            category,
        })
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let status_code = if created {
        tracing::info!(chat_id = %chat.id, number = %chat.contact.number, "Chat created");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status_code, Json(populate_chat(&app_state, chat).await?)))
}

pub async fn update_chat(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateChatDto>,
) -> Result<impl IntoResponse, HttpError> {
    let status = parse_optional::<ChatStatus>(body.status.as_deref())
        .map_err(HttpError::bad_request)?;
    let category = parse_optional::<ChatCategory>(body.category.as_deref())
        .map_err(HttpError::bad_request)?;

    let mut update = body.assigned_to.map(assignment_update).unwrap_or_default();
    // explicit values win over the ones implied by the assignment
    if status.is_some() {
        update.status = status;
    }
    if category.is_some() {
        update.category = category;
    }
    update.is_important = body.is_important;

    Ok(Json(apply_update(&app_state, chat_id, &update).await?))
}

pub async fn assign_chat(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
    Json(body): Json<AssignChatDto>,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(user_id) = body.user_id {
        app_state
            .db_client
            .get_user(Some(user_id), None)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .ok_or(ServiceError::UserNotFound(user_id))?;
    }

    let chat = apply_update(&app_state, chat_id, &assignment_update(body.user_id)).await?;

    tracing::info!(
        chat_id = %chat_id,
        assigned_to = ?body.user_id,
        actor_id = %actor.user.id,
        "Chat assignment changed"
    );

    Ok(Json(chat))
}

pub async fn update_chat_status(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ChatStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = body
        .status
        .trim()
        .parse::<ChatStatus>()
        .map_err(HttpError::bad_request)?;

    let update = ChatUpdate {
        status: Some(status),
        ..Default::default()
    };

    Ok(Json(apply_update(&app_state, chat_id, &update).await?))
}

pub async fn mark_important(
    Path(chat_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<ImportantDto>,
) -> Result<impl IntoResponse, HttpError> {
    let update = ChatUpdate {
        is_important: Some(body.is_important),
        ..Default::default()
    };

    Ok(Json(apply_update(&app_state, chat_id, &update).await?))
}
