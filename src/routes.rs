// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    handler::{
        auth::auth_handler, bridge::bridge_handler, chats::chats_handler,
        messages::messages_handler, realtime::websocket_handler, users::users_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check(Extension(app_state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "store": app_state.db_client.backend_name(),
        "bridge": app_state.bridge.is_enabled(),
        "connections": app_state.hub.connection_count().await,
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest(
            "/users",
            users_handler()
                .layer(middleware::from_fn(auth)),
        )
        .nest(
            "/chats",
            chats_handler()
                .layer(middleware::from_fn(auth)),
        )
        .nest(
            "/messages",
            messages_handler()
                .layer(middleware::from_fn(auth)),
        )
        .nest("/bridge", bridge_handler())
        .layer(TraceLayer::new_for_http());

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket_handler))
        .nest("/api", api_route);

    // the built frontend, when deployed alongside
    let router = match &app_state.env.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(Extension(app_state))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        config::Config,
        handler::{bridge::SIGNATURE_HEADER, realtime::handle_client_frame},
        service::{
            bridge::sign_payload,
            chat_state::EMPTY_CONTENT_PLACEHOLDER,
            realtime::ServerEvent,
        },
        test_support::{test_app, test_app_with, TestApp},
    };

    async fn create_chat(app: &TestApp, token: &str, number: &str) -> serde_json::Value {
        let (_, chat) = app
            .request(
                Method::POST,
                "/api/chats",
                Some(token),
                Some(json!({"contact": {"name": "Ana", "number": number}})),
            )
            .await;
        chat
    }

    async fn inbound(app: &TestApp, from: &str, body: &str) -> serde_json::Value {
        let (status, response) = app
            .request(
                Method::POST,
                "/api/bridge/webhook",
                None,
                Some(json!({
                    "event": "onmessage",
                    "data": {"from": from, "body": body, "sender": {"pushname": "Ana"}}
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        response
    }

    #[tokio::test]
    async fn health_reports_the_store() {
        let app = test_app();
        let (status, body) = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["connections"], 0);

        let (_connection, _events) = app.state.hub.connect().await;
        let (_, body) = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(body["connections"], 1);
    }

    #[tokio::test]
    async fn registration_token_resolves_to_the_same_user() {
        let app = test_app();
        let (token, user) = app.register("Ana", "agent").await;

        let (status, me) = app.request(Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["id"], user["id"]);
        assert!(me.get("password").is_none());
    }

    #[tokio::test]
    async fn me_requires_a_valid_token() {
        let app = test_app();
        let (status, body) = app.request(Method::GET, "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "fail");

        let (status, _) = app
            .request(Method::GET, "/api/auth/me", Some("garbage"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_email_and_bad_credentials_are_rejected() {
        let app = test_app();
        app.register("Ana", "agent").await;

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({"name": "Ana", "email": "ana@example.com", "password": "secret123"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ana@example.com", "password": "wrong-password"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ana@example.com", "password": "secret123"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["token"].is_string());
    }

    #[tokio::test]
    async fn overlong_passwords_are_a_bad_request() {
        let app = test_app();
        let (status, body) = app
            .request(
                Method::POST,
                "/api/auth/register",
                None,
                Some(json!({
                    "name": "Ana",
                    "email": "ana@example.com",
                    "password": "x".repeat(65),
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");

        let (status, _) = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({"email": "ana@example.com", "password": "x".repeat(65)})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_is_rate_limited() {
        let app = test_app();
        let attempt = json!({"email": "nobody@example.com", "password": "secret123"});

        for _ in 0..10 {
            let (status, _) = app
                .request(Method::POST, "/api/auth/login", None, Some(attempt.clone()))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (status, _) = app
            .request(Method::POST, "/api/auth/login", None, Some(attempt))
            .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn creating_the_same_contact_twice_returns_one_chat() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;
        let body = json!({"contact": {"name": "Ana", "number": "5511999"}});

        let (first_status, first) = app
            .request(Method::POST, "/api/chats", Some(&token), Some(body.clone()))
            .await;
        let (second_status, second) = app
            .request(Method::POST, "/api/chats", Some(&token), Some(body))
            .await;

        assert_eq!(first_status, StatusCode::CREATED);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first["id"], second["id"]);
        assert_eq!(first["status"], "unassigned");
        assert_eq!(first["category"], "unassigned");
    }

    #[tokio::test]
    async fn assigning_a_chat_opens_it_in_mine() {
        let app = test_app();
        let (token, user) = app.register("Ana", "agent").await;
        let chat = create_chat(&app, &token, "5511").await;
        let uri = format!("/api/chats/{}/assign", chat["id"].as_str().unwrap());

        let (status, assigned) = app
            .request(Method::PATCH, &uri, Some(&token), Some(json!({"userId": user["id"]})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assigned["status"], "open");
        assert_eq!(assigned["category"], "mine");
        assert_eq!(assigned["assignedTo"]["id"], user["id"]);
        assert_eq!(assigned["assignedTo"]["name"], "Ana");

        let (status, cleared) = app
            .request(Method::PATCH, &uri, Some(&token), Some(json!({"userId": null})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["status"], "unassigned");
        assert!(cleared["assignedTo"].is_null());

        let (status, _) = app
            .request(
                Method::PATCH,
                &uri,
                Some(&token),
                Some(json!({"userId": uuid::Uuid::new_v4()})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn generic_update_couples_assignment_but_explicit_values_win() {
        let app = test_app();
        let (token, user) = app.register("Ana", "agent").await;
        let chat = create_chat(&app, &token, "5512").await;
        let uri = format!("/api/chats/{}", chat["id"].as_str().unwrap());

        let (_, updated) = app
            .request(
                Method::PUT,
                &uri,
                Some(&token),
                Some(json!({"assignedTo": user["id"], "status": "snoozed", "isImportant": true})),
            )
            .await;
        assert_eq!(updated["status"], "snoozed");
        assert_eq!(updated["category"], "mine");
        assert_eq!(updated["isImportant"], true);

        let (_, untouched) = app
            .request(Method::PUT, &uri, Some(&token), Some(json!({"category": "team"})))
            .await;
        assert_eq!(untouched["assignedTo"]["id"], user["id"]);
        assert_eq!(untouched["category"], "team");

        let (status, _) = app
            .request(Method::PATCH, &format!("{}/status", uri), Some(&token), Some(json!({"status": "archived"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = format!("/api/chats/{}/important", uuid::Uuid::new_v4());
        let (status, _) = app
            .request(Method::PATCH, &missing, Some(&token), Some(json!({"isImportant": true})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_listing_filters_by_category_and_owner() {
        let app = test_app();
        let (ana, ana_user) = app.register("Ana", "agent").await;
        let (bia, _) = app.register("Bia", "agent").await;

        let mine = create_chat(&app, &ana, "1").await;
        create_chat(&app, &ana, "2").await;
        app.request(
            Method::PATCH,
            &format!("/api/chats/{}/assign", mine["id"].as_str().unwrap()),
            Some(&ana),
            Some(json!({"userId": ana_user["id"]})),
        )
        .await;

        let (_, all) = app.request(Method::GET, "/api/chats", Some(&ana), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, ana_mine) = app
            .request(Method::GET, "/api/chats?category=mine", Some(&ana), None)
            .await;
        assert_eq!(ana_mine.as_array().unwrap().len(), 1);
        assert_eq!(ana_mine[0]["assignedTo"]["status"], "available");

        let (_, bia_mine) = app
            .request(Method::GET, "/api/chats?category=mine", Some(&bia), None)
            .await;
        assert!(bia_mine.as_array().unwrap().is_empty());

        let (status, _) = app
            .request(Method::GET, "/api/chats?category=archive", Some(&ana), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rest_send_stores_placeholder_and_assigns_without_relaying_it() {
        let app = test_app();
        let (token, user) = app.register("Ana", "agent").await;
        let chat = create_chat(&app, &token, "5511999").await;

        let (status, message) = app
            .request(
                Method::POST,
                "/api/messages",
                Some(&token),
                Some(json!({
                    "chatId": chat["id"],
                    "mediaUrl": "https://cdn.example.com/a.jpg",
                    "mediaType": "image"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(message["content"], EMPTY_CONTENT_PLACEHOLDER);
        assert_eq!(message["sender"], "user");
        assert_eq!(message["userId"]["id"], user["id"]);

        let (_, chat) = app
            .request(Method::GET, &format!("/api/chats/{}", chat["id"].as_str().unwrap()), Some(&token), None)
            .await;
        assert_eq!(chat["status"], "open");
        assert_eq!(chat["category"], "mine");
        assert_eq!(chat["lastMessage"], EMPTY_CONTENT_PLACEHOLDER);

        let (status, _) = app
            .request(
                Method::POST,
                "/api/messages",
                Some(&token),
                Some(json!({"chatId": chat["id"], "content": "Oi, tudo bem?"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        for _ in 0..50 {
            if !app.bridge.sent().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            app.bridge.sent(),
            vec![("5511999".to_string(), "Oi, tudo bem?".to_string())]
        );
    }

    #[tokio::test]
    async fn rest_send_to_unknown_chat_is_not_found() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;
        let chat_id = uuid::Uuid::new_v4();

        let (status, _) = app
            .request(
                Method::POST,
                "/api/messages",
                Some(&token),
                Some(json!({"chatId": chat_id, "content": "hi"})),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, messages) = app
            .request(Method::GET, &format!("/api/messages/chat/{}", chat_id), Some(&token), None)
            .await;
        assert!(messages.as_array().unwrap().is_empty());
        assert!(app.bridge.sent().is_empty());
    }

    #[tokio::test]
    async fn inbound_messages_then_read_drive_unread_count_to_zero() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;

        let first = inbound(&app, "5511888@c.us", "Olá").await;
        assert_eq!(first["status"], "stored");
        inbound(&app, "5511888@c.us", "Tem alguém?").await;

        let (_, chats) = app.request(Method::GET, "/api/chats", Some(&token), None).await;
        let chats = chats.as_array().unwrap();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0]["unreadCount"], 2);
        assert_eq!(chats[0]["contact"]["name"], "Ana");
        let chat_id = chats[0]["id"].as_str().unwrap().to_string();

        let (_, messages) = app
            .request(Method::GET, &format!("/api/messages/chat/{}", chat_id), Some(&token), None)
            .await;
        let messages = messages.as_array().unwrap();
        assert_eq!(messages[0]["content"], "Olá");
        assert_eq!(messages[1]["content"], "Tem alguém?");

        for message in messages {
            let uri = format!("/api/messages/{}/read", message["id"].as_str().unwrap());
            let (status, read) = app.request(Method::PATCH, &uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(read["isRead"], true);
        }

        let (_, chat) = app
            .request(Method::GET, &format!("/api/chats/{}", chat_id), Some(&token), None)
            .await;
        assert_eq!(chat["unreadCount"], 0);
    }

    #[tokio::test]
    async fn group_and_status_events_are_acknowledged_but_ignored() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;

        let (status, body) = app
            .request(
                Method::POST,
                "/api/bridge/webhook",
                None,
                Some(json!({"from": "123@g.us", "body": "hi", "isGroupMsg": true})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");

        let (_, chats) = app.request(Method::GET, "/api/chats", Some(&token), None).await;
        assert!(chats.as_array().unwrap().is_empty());

        let (status, _) = app
            .request(Method::POST, "/api/bridge/webhook", None, Some(json!({"nope": 1})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn inbound_events_without_a_sender_number_create_no_chat() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;

        for from in ["", "   "] {
            let (status, body) = app
                .request(
                    Method::POST,
                    "/api/bridge/webhook",
                    None,
                    Some(json!({"from": from, "body": "hi"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ignored");
        }

        let (_, chats) = app.request(Method::GET, "/api/chats", Some(&token), None).await;
        assert!(chats.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn signed_webhooks_require_a_matching_signature() {
        let mut config = Config::for_tests();
        config.bridge_webhook_secret = Some("hook-secret".to_string());
        let app = test_app_with(config);

        let payload = json!({"from": "5511", "body": "oi"}).to_string();
        let send = |signature: Option<String>| {
            let mut builder = axum::http::Request::builder()
                .method(Method::POST)
                .uri("/api/bridge/webhook")
                .header("content-type", "application/json");
            if let Some(signature) = signature {
                builder = builder.header(SIGNATURE_HEADER, signature);
            }
            builder.body(axum::body::Body::from(payload.clone())).unwrap()
        };

        use tower::ServiceExt;
        let unsigned = app.router.clone().oneshot(send(None)).await.unwrap();
        assert_eq!(unsigned.status(), StatusCode::UNAUTHORIZED);

        let forged = app
            .router
            .clone()
            .oneshot(send(Some(sign_payload(payload.as_bytes(), "other"))))
            .await
            .unwrap();
        assert_eq!(forged.status(), StatusCode::UNAUTHORIZED);

        let signed = app
            .router
            .clone()
            .oneshot(send(Some(sign_payload(payload.as_bytes(), "hook-secret"))))
            .await
            .unwrap();
        assert_eq!(signed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn comments_are_validated_and_populated() {
        let app = test_app();
        let (token, user) = app.register("Ana", "agent").await;
        let chat = create_chat(&app, &token, "77").await;
        let (_, message) = app
            .request(
                Method::POST,
                "/api/messages",
                Some(&token),
                Some(json!({"chatId": chat["id"], "content": "hi"})),
            )
            .await;
        let uri = format!("/api/messages/{}/comment", message["id"].as_str().unwrap());

        let (status, _) = app
            .request(Method::POST, &uri, Some(&token), Some(json!({"content": "   "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, commented) = app
            .request(Method::POST, &uri, Some(&token), Some(json!({"content": "cliente VIP"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(commented["comments"][0]["content"], "cliente VIP");
        assert_eq!(commented["comments"][0]["userId"]["id"], user["id"]);

        let missing = format!("/api/messages/{}/comment", uuid::Uuid::new_v4());
        let (status, _) = app
            .request(Method::POST, &missing, Some(&token), Some(json!({"content": "x"})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let missing = format!("/api/messages/{}/read", uuid::Uuid::new_v4());
        let (status, body) = app.request(Method::PATCH, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Message not found");
    }

    #[tokio::test]
    async fn user_updates_respect_ownership_and_roles() {
        let app = test_app();
        let (admin, _) = app.register("Root", "admin").await;
        let (ana, ana_user) = app.register("Ana", "agent").await;
        let (_, bia_user) = app.register("Bia", "agent").await;
        let bia_uri = format!("/api/users/{}", bia_user["id"].as_str().unwrap());
        let ana_uri = format!("/api/users/{}", ana_user["id"].as_str().unwrap());

        let (status, _) = app
            .request(Method::PUT, &bia_uri, Some(&ana), Some(json!({"name": "x"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .request(Method::PUT, &ana_uri, Some(&ana), Some(json!({"role": "admin"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = app
            .request(Method::PUT, &ana_uri, Some(&ana), Some(json!({"name": "Ana Paula", "status": "away"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["name"], "Ana Paula");
        assert_eq!(body["user"]["status"], "away");

        let (status, _) = app
            .request(Method::PUT, &ana_uri, Some(&ana), Some(json!({"email": "bia@example.com"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .request(Method::PUT, &bia_uri, Some(&admin), Some(json!({"role": "admin"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["role"], "admin");

        let (status, me) = app
            .request(Method::PATCH, "/api/users/status", Some(&ana), Some(json!({"status": "busy"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["status"], "busy");

        let (status, _) = app
            .request(Method::PATCH, "/api/users/status", Some(&ana), Some(json!({"status": "sleeping"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_admins_delete_users() {
        let app = test_app();
        let (admin, _) = app.register("Root", "admin").await;
        let (ana, ana_user) = app.register("Ana", "agent").await;
        let uri = format!("/api/users/{}", ana_user["id"].as_str().unwrap());

        let (status, _) = app.request(Method::DELETE, &uri, Some(&ana), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.request(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app.request(Method::GET, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app.request(Method::DELETE, &uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, users) = app.request(Method::GET, "/api/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(users.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn socket_send_without_chat_id_only_errors_to_the_sender() {
        let app = test_app();
        let (sender, mut sender_rx) = app.state.hub.connect().await;
        let (_other, mut other_rx) = app.state.hub.connect().await;

        handle_client_frame(
            &app.state,
            sender,
            None,
            r#"{"event": "send-message", "data": {"message": "hello"}}"#,
        )
        .await;

        match sender_rx.try_recv() {
            Ok(ServerEvent::MessageError { error }) => assert!(error.contains("chatId")),
            other => panic!("expected message-error, got {:?}", other),
        }
        assert!(other_rx.try_recv().is_err());
        assert!(app.bridge.sent().is_empty());
    }

    #[tokio::test]
    async fn socket_send_reaches_room_members() {
        let app = test_app();
        let (token, _) = app.register("Ana", "agent").await;
        let chat = create_chat(&app, &token, "99").await;
        let chat_id = chat["id"].as_str().unwrap();

        let (sender, mut sender_rx) = app.state.hub.connect().await;
        let (viewer, mut viewer_rx) = app.state.hub.connect().await;
        handle_client_frame(
            &app.state,
            viewer,
            None,
            &json!({"event": "join-chat", "data": chat_id}).to_string(),
        )
        .await;

        handle_client_frame(
            &app.state,
            sender,
            None,
            &json!({"event": "send-message", "data": {"chatId": chat_id, "message": {"content": "oi"}}})
                .to_string(),
        )
        .await;

        assert!(matches!(sender_rx.try_recv(), Ok(ServerEvent::NewMessage { .. })));
        assert!(sender_rx.try_recv().is_err());
        assert!(matches!(viewer_rx.try_recv(), Ok(ServerEvent::NewMessage { .. })));
        match viewer_rx.try_recv() {
            Ok(ServerEvent::ReceiveMessage(message)) => assert_eq!(message.content, "oi"),
            other => panic!("expected receive-message, got {:?}", other),
        }

        // socket sends are not relayed to the bridge
        assert!(app.bridge.sent().is_empty());
    }

    #[tokio::test]
    async fn malformed_socket_frames_are_ignored() {
        let app = test_app();
        let (connection, mut rx) = app.state.hub.connect().await;

        handle_client_frame(&app.state, connection, None, "not json").await;
        handle_client_frame(&app.state, connection, None, r#"{"event": "dance"}"#).await;

        assert!(rx.try_recv().is_err());
    }
}
