// handler/users.rs
use std::sync::Arc;

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{is_unique_violation, userdb::UserProfileUpdate, UserExt},
    dtos::{
        parse_optional,
        userdtos::{FilterUserDto, Response, UpdateUserDto, UserData, UserStatusUpdateDto},
    },
    error::{ErrorMessage, HttpError},
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::{UserRole, UserStatus},
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/", get(get_users))
        .route("/status", patch(update_own_status))
        .route("/:id", get(get_user).put(update_user))
        .route(
            "/:id",
            delete(delete_user).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let users = app_state
        .db_client
        .get_users()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    Ok(Json(FilterUserDto::filter_users(&users)))
}

pub async fn get_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_string()))?;

    Ok(Json(FilterUserDto::filter_user(&user)))
}

pub async fn update_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let actor = actor.user;
    if !actor.is_admin() && actor.id != user_id {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    let role = parse_optional::<UserRole>(body.role.as_deref()).map_err(HttpError::bad_request)?;
    if role.is_some() && !actor.is_admin() {
        return Err(HttpError::forbidden("Only admins can change a user's role"));
    }
    let status =
        parse_optional::<UserStatus>(body.status.as_deref()).map_err(HttpError::bad_request)?;

    if let Some(email) = &body.email {
        let holder = app_state
            .db_client
            .get_user(None, Some(email))
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?;
        if holder.map_or(false, |holder| holder.id != user_id) {
            return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
        }
    }

    let update = UserProfileUpdate {
        name: body.name,
        email: body.email,
        avatar: body.avatar,
        status,
        role,
    };

    let user = app_state
        .db_client
        .update_user(user_id, &update)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::bad_request(ErrorMessage::EmailExist.to_string())
            } else {
                HttpError::server_error(e.to_string())
            }
        })?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNotFound.to_string()))?;

    tracing::info!(user_id = %user.id, actor_id = %actor.id, "User updated");

    Ok(Json(UserData {
        user: FilterUserDto::filter_user(&user),
    }))
}

pub async fn update_own_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
    Json(body): Json<UserStatusUpdateDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = body
        .status
        .trim()
        .parse::<UserStatus>()
        .map_err(HttpError::bad_request)?;

    let user = app_state
        .db_client
        .update_user_status(actor.user.id, status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::UserNoLongerExist.to_string()))?;

    Ok(Json(FilterUserDto::filter_user(&user)))
}

pub async fn delete_user(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(actor): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let deleted = app_state
        .db_client
        .delete_user(user_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if !deleted {
        return Err(HttpError::not_found(ErrorMessage::UserNotFound.to_string()));
    }

    tracing::info!(user_id = %user_id, actor_id = %actor.user.id, "User deleted");

    Ok(Json(Response {
        status: "success",
        message: "User deleted successfully".to_string(),
    }))
}
