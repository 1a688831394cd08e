// handler/auth.rs
use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::{is_unique_violation, UserExt},
    dtos::{
        parse_optional,
        userdtos::{AuthResponseDto, FilterUserDto, LoginUserDto, RegisterUserDto},
    },
    error::{ErrorMessage, HttpError},
    middleware::{
        auth,
        rate_limit::{login_rate_limiter, rate_limit_middleware},
        JWTAuthMiddeware,
    },
    models::usermodel::{User, UserRole},
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    let limiter = Arc::new(login_rate_limiter());

    Router::new()
        .route("/register", post(register))
        .route(
            "/login",
            post(login).route_layer(middleware::from_fn_with_state(
                limiter,
                rate_limit_middleware,
            )),
        )
        .route("/me", get(get_me).layer(middleware::from_fn(auth)))
}

fn issue_token(app_state: &AppState, user: &User) -> Result<String, HttpError> {
    token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let role = parse_optional::<UserRole>(body.role.as_deref())
        .map_err(HttpError::bad_request)?
        .unwrap_or_default();

    let existing_user = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing_user.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::EmailExist.to_string()));
    }

    let hashed_password = password::hash(&body.password).map_err(|e| match e {
        ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
            HttpError::bad_request(e.to_string())
        }
        _ => HttpError::server_error(e.to_string()),
    })?;

    let user = app_state
        .db_client
        .save_user(&body.name, &body.email, &hashed_password, role)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                HttpError::bad_request(ErrorMessage::EmailExist.to_string())
            } else {
                HttpError::server_error(e.to_string())
            }
        })?;

    let token = issue_token(&app_state, &user)?;

    tracing::info!(user_id = %user.id, role = user.role.to_str(), "User registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponseDto {
            token,
            user: FilterUserDto::filter_user(&user),
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()));
    }

    let token = issue_token(&app_state, &user)?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();
    let cookie_value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let mut response = Json(AuthResponseDto {
        token,
        user: FilterUserDto::filter_user(&user),
    })
    .into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie_value);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(response)
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    Ok(Json(FilterUserDto::filter_user(&user.user)))
}
