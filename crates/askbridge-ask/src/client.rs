//! Streaming client for the Ask conversations endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AskResponse};
use crate::error::{AskError, Result};
use crate::sse::event_stream;

/// Generous upper bound for one streamed answer — matches the backend's
/// long-running agent queries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Interface to the Ask backend — one aggregated answer per query.
#[async_trait]
pub trait AskBackend: Send + Sync {
    /// Submit `query`, optionally continuing `conversation_id`, and wait for
    /// the fully aggregated response. No retries: errors surface as-is.
    async fn send_query(
        &self,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<AskResponse>;
}

pub struct AskClient {
    client: reqwest::Client,
    api_key: String,
    agent_id: String,
    base_url: String,
}

impl AskClient {
    pub fn new(api_key: String, agent_id: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            agent_id,
            base_url,
        }
    }
}

#[async_trait]
impl AskBackend for AskClient {
    async fn send_query(
        &self,
        query: &str,
        conversation_id: Option<&str>,
    ) -> Result<AskResponse> {
        let mut body = serde_json::json!({
            "agent_id": self.agent_id,
            "query": query,
            "stream": true,
            "is_incognito": false,
        });
        if let Some(id) = conversation_id {
            body["conversation_id"] = serde_json::json!(id);
        }

        let url = format!("{}/v1/conversations/", self.base_url.trim_end_matches('/'));
        debug!(chars = query.len(), continuing = conversation_id.is_some(), "sending query to Ask");

        let resp = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "Ask API error");
            return Err(AskError::Api { status, body: text });
        }

        let answer = aggregate(event_stream(resp), conversation_id).await?;
        info!(
            conversation_id = ?answer.conversation_id,
            message_id = ?answer.message_id,
            chars = answer.message.len(),
            "Ask stream aggregated"
        );
        Ok(answer)
    }
}
