use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{info, warn};

use askbridge_whatsapp::webhook::{extract_text_messages, Notification};
use askbridge_whatsapp::process_message;

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /webhook
///
/// Meta's subscription handshake: echo `hub.challenge` back when the mode is
/// `subscribe` and the verify token matches, 403 otherwise.
pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, StatusCode> {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);

    if mode == Some("subscribe") && token == Some(state.config.whatsapp.verify_token.as_str()) {
        if let Some(challenge) = params.get("hub.challenge") {
            info!("webhook verification handshake accepted");
            return Ok(challenge.clone());
        }
    }

    warn!("webhook verification handshake rejected");
    Err(StatusCode::FORBIDDEN)
}

/// POST /webhook
///
/// Signed notification ingress. Verifies X-Hub-Signature-256, then spawns a
/// task per inbound text message so the 200 goes back to Meta immediately.
pub async fn notify_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Err(e) = verify_hmac_sha256(&headers, &body, &state.config.whatsapp.app_secret) {
        warn!(reason = %e, "webhook signature rejected");
        return StatusCode::UNAUTHORIZED;
    }

    let notification: Notification = match serde_json::from_slice(&body) {
        Ok(n) => n,
        Err(e) => {
            warn!(error = %e, "undecodable webhook body");
            return StatusCode::BAD_REQUEST;
        }
    };

    for inbound in extract_text_messages(&notification) {
        info!(wa_id = %inbound.wa_id, message_id = %inbound.message_id, "inbound message accepted");
        let ctx = Arc::clone(&state.ctx);
        tokio::spawn(async move {
            process_message(&ctx, inbound).await;
        });
    }

    StatusCode::OK
}

// ── Auth helpers ──────────────────────────────────────────────────────────────

/// Verify Meta-style HMAC-SHA256: `sha256=<hex>` in X-Hub-Signature-256.
fn verify_hmac_sha256(headers: &HeaderMap, body: &Bytes, secret: &str) -> Result<(), String> {
    let sig_header = headers
        .get("x-hub-signature-256")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| "missing X-Hub-Signature-256 header".to_string())?;

    let sig_hex = sig_header
        .strip_prefix("sha256=")
        .ok_or_else(|| "malformed X-Hub-Signature-256 header".to_string())?;

    let expected =
        hex::decode(sig_hex).map_err(|_| "X-Hub-Signature-256 is not valid hex".to_string())?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| "invalid HMAC key length".to_string())?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| "HMAC signature mismatch".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn accepts_valid_signature() {
        let body = Bytes::from_static(b"{\"object\":\"whatsapp_business_account\"}");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-hub-signature-256",
            sign("top-secret", &body).parse().unwrap(),
        );
        assert!(verify_hmac_sha256(&headers, &body, "top-secret").is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let body = Bytes::from_static(b"{}");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-hub-signature-256",
            sign("other-secret", &body).parse().unwrap(),
        );
        assert!(verify_hmac_sha256(&headers, &body, "top-secret").is_err());
    }

    #[test]
    fn rejects_missing_header() {
        let body = Bytes::from_static(b"{}");
        let headers = HeaderMap::new();
        let err = verify_hmac_sha256(&headers, &body, "top-secret").unwrap_err();
        assert!(err.contains("missing"));
    }

    #[test]
    fn rejects_tampered_body() {
        let body = Bytes::from_static(b"{\"a\":1}");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-hub-signature-256",
            sign("top-secret", b"{\"a\":2}").parse().unwrap(),
        );
        assert!(verify_hmac_sha256(&headers, &body, "top-secret").is_err());
    }

    #[test]
    fn rejects_prefix_free_header() {
        let body = Bytes::from_static(b"{}");
        let mut headers = HeaderMap::new();
        headers.insert("x-hub-signature-256", "deadbeef".parse().unwrap());
        let err = verify_hmac_sha256(&headers, &body, "top-secret").unwrap_err();
        assert!(err.contains("malformed"));
    }
}
