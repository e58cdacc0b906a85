//! WhatsApp Cloud API client — text sends, read receipts, typing indicator.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::WaError;

const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v21.0";

/// Outbound messaging operations the handler needs from the platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send one text message (caller guarantees the length bound).
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WaError>;

    /// Mark an inbound message as read.
    async fn mark_read(&self, message_id: &str) -> Result<(), WaError>;

    /// Show the typing indicator in the user's chat. The indicator expires
    /// on its own after ~25 seconds, so callers refresh it in a loop.
    async fn show_typing(&self, message_id: &str) -> Result<(), WaError>;
}

pub struct WaClient {
    client: reqwest::Client,
    token: String,
    phone_id: String,
    base_url: String,
}

impl WaClient {
    pub fn new(token: String, phone_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            phone_id,
            base_url: GRAPH_BASE_URL.to_string(),
        }
    }

    /// Override the Graph endpoint (tests, proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// POST one payload to the phone-number messages endpoint.
    async fn post_message(&self, body: &Value) -> Result<(), WaError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if resp.status().is_success() {
            debug!(status, "Graph message accepted");
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        match serde_json::from_str::<GraphErrorEnvelope>(&text) {
            Ok(envelope) => {
                let e = envelope.error;
                warn!(
                    code = e.code,
                    subcode = ?e.error_subcode,
                    kind = %e.kind,
                    is_transient = ?e.is_transient,
                    fbtrace_id = ?e.fbtrace_id,
                    "Graph API error"
                );
                Err(WaError::Api {
                    code: e.code,
                    subcode: e.error_subcode,
                    kind: e.kind,
                    message: e.message,
                    is_transient: e.is_transient,
                    fbtrace_id: e.fbtrace_id,
                })
            }
            Err(_) => {
                warn!(status, body = %text, "Graph returned non-JSON error body");
                Err(WaError::Unexpected { status, body: text })
            }
        }
    }
}

#[async_trait]
impl ChatTransport for WaClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), WaError> {
        self.post_message(&json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": {"body": body},
        }))
        .await
    }

    async fn mark_read(&self, message_id: &str) -> Result<(), WaError> {
        self.post_message(&json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
        }))
        .await
    }

    async fn show_typing(&self, message_id: &str) -> Result<(), WaError> {
        // Typing rides on a read receipt for the message being answered.
        self.post_message(&json!({
            "messaging_product": "whatsapp",
            "status": "read",
            "message_id": message_id,
            "typing_indicator": {"type": "text"},
        }))
        .await
    }
}

// Graph error envelope (deserialization only).

#[derive(Deserialize)]
struct GraphErrorEnvelope {
    error: GraphError,
}

#[derive(Deserialize)]
struct GraphError {
    message: String,
    #[serde(rename = "type")]
    kind: String,
    code: i64,
    error_subcode: Option<i64>,
    is_transient: Option<bool>,
    fbtrace_id: Option<String>,
}
