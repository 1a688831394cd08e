//! WhatsApp bridge adapter.
//!
//! The bridge is an external WPPConnect-style server that owns the WhatsApp
//! Web session. Outbound text goes through its HTTP API; inbound messages
//! reach us through the signed webhook in `handler::bridge`.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::service::error::ServiceError;

#[async_trait]
pub trait WhatsAppBridge: Send + Sync + std::fmt::Debug {
    /// Best-effort delivery of a text message to a contact number.
    async fn send_text(&self, number: &str, text: &str) -> Result<(), ServiceError>;

    fn is_enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone)]
pub struct WppConnectBridge {
    http: reqwest::Client,
    base_url: String,
    session: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTextRequest<'a> {
    phone: &'a str,
    message: &'a str,
    is_group: bool,
}

impl WppConnectBridge {
    pub fn new(
        base_url: &str,
        session: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Bridge(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: session.to_string(),
            token,
        })
    }

    fn send_url(&self) -> String {
        format!("{}/api/{}/send-message", self.base_url, self.session)
    }
}

#[async_trait]
impl WhatsAppBridge for WppConnectBridge {
    async fn send_text(&self, number: &str, text: &str) -> Result<(), ServiceError> {
        let mut request = self.http.post(self.send_url()).json(&SendTextRequest {
            phone: number,
            message: text,
            is_group: false,
        });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Bridge(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Bridge(format!(
                "send-message returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

/// Used when no bridge URL is configured: outbound sends are skipped.
#[derive(Debug, Clone, Default)]
pub struct DisabledBridge;

#[async_trait]
impl WhatsAppBridge for DisabledBridge {
    async fn send_text(&self, number: &str, _text: &str) -> Result<(), ServiceError> {
        tracing::debug!(number, "Bridge not configured, outbound message skipped");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct BridgeSender {
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeMediaData {
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

/// Inbound message as delivered by the bridge.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BridgeInboundEvent {
    #[serde(default)]
    pub event: Option<String>,
    pub from: String,
    #[serde(default)]
    pub sender: Option<BridgeSender>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_status: bool,
    #[serde(default)]
    pub is_group_msg: bool,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub media_data: Option<BridgeMediaData>,
}

impl BridgeInboundEvent {
    /// Status broadcasts, group traffic, events without a sender number and
    /// non-message webhook events are ignored.
    pub fn is_ignored(&self) -> bool {
        let not_a_message = self
            .event
            .as_deref()
            .map_or(false, |event| !event.eq_ignore_ascii_case("onmessage"));

        not_a_message
            || self.from.trim().is_empty()
            || self.is_status
            || self.is_group_msg
            || self.from.ends_with("@g.us")
    }

    pub fn display_name(&self) -> Option<&str> {
        let sender = self.sender.as_ref()?;
        [sender.pushname.as_deref(), sender.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
    }
}

/// Webhook body: either a bare event or an `{event, data}` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BridgeWebhookPayload {
    Envelope { event: String, data: BridgeInboundEvent },
    Event(BridgeInboundEvent),
}

impl BridgeWebhookPayload {
    pub fn into_event(self) -> BridgeInboundEvent {
        match self {
            BridgeWebhookPayload::Envelope { event, mut data } => {
                data.event = Some(event);
                data
            }
            BridgeWebhookPayload::Event(event) => event,
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

pub fn sign_payload(payload: &[u8], secret: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> bool {
    let expected = sign_payload(payload, secret);
    if expected.is_empty() {
        return false;
    }

    ConstantTimeEq::ct_eq(
        signature.trim().to_ascii_lowercase().as_bytes(),
        expected.as_bytes(),
    )
    .into()
}

/// Bridge double that records every outbound send.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingBridge {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

#[cfg(test)]
impl RecordingBridge {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl WhatsAppBridge for RecordingBridge {
    async fn send_text(&self, number: &str, text: &str) -> Result<(), ServiceError> {
        self.sent
            .lock()
            .unwrap()
            .push((number.to_string(), text.to_string()));
        if self.fail {
            return Err(ServiceError::Bridge("bridge offline".to_string()));
        }
        Ok(())
    }
}
