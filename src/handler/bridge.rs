// handler/bridge.rs
use std::sync::Arc;

use axum::{
    body::Bytes, http::HeaderMap, response::IntoResponse, routing::post, Extension, Json, Router,
};
use serde_json::json;

use crate::{
    error::HttpError,
    service::bridge::{verify_signature, BridgeWebhookPayload},
    AppState,
};

pub const SIGNATURE_HEADER: &str = "x-bridge-signature";

pub fn bridge_handler() -> Router {
    Router::new().route("/webhook", post(receive_webhook))
}

pub async fn receive_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(secret) = &app_state.env.bridge_webhook_secret {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                tracing::warn!("Bridge webhook without signature");
                HttpError::unauthorized("Missing webhook signature")
            })?;

        if !verify_signature(&body, signature, secret) {
            tracing::warn!("Bridge webhook with invalid signature");
            return Err(HttpError::unauthorized("Invalid webhook signature"));
        }
    }

    let payload: BridgeWebhookPayload = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Undecodable bridge webhook");
        HttpError::bad_request(format!("Invalid webhook payload: {}", e))
    })?;

    let status = app_state
        .sync_service
        .ingest_bridge_event(&payload.into_event())
        .await;

    Ok(Json(json!({ "status": status.to_str() })))
}
