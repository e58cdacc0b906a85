//! Reduction of the Ask event stream into one logical response.

use futures_util::{pin_mut, Stream, StreamExt};
use serde_json::Value;

use crate::error::{AskError, Result};
use crate::sse::SseEvent;

/// The aggregated outcome of one streamed query.
#[derive(Debug, Clone)]
pub struct AskResponse {
    /// Ordered concatenation of all `message` event fragments.
    pub message: String,
    /// Backend-assigned conversation id, or the caller's id when the
    /// metadata carried none.
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
}

/// Reduce a stream of decoded events into an [`AskResponse`].
///
/// Applied in arrival order:
/// - `error` aborts immediately with the decoded payload; partial text is
///   discarded.
/// - `metadata` / `conversation_created` objects merge into the pending
///   response, later fields overwriting earlier ones.
/// - `message` contributes its `data` string fragment (empty when absent).
/// - anything else is ignored for forward compatibility.
pub async fn aggregate<S>(
    events: S,
    fallback_conversation_id: Option<&str>,
) -> Result<AskResponse>
where
    S: Stream<Item = Result<SseEvent>>,
{
    pin_mut!(events);

    let mut merged = serde_json::Map::new();
    let mut fragments: Vec<String> = Vec::new();

    while let Some(event) = events.next().await {
        let event = event?;
        match event.event.as_str() {
            "error" => {
                let payload: Value = serde_json::from_str(&event.data)
                    .map_err(|e| AskError::Parse(format!("error event payload: {e}")))?;
                return Err(AskError::Upstream(payload));
            }
            "metadata" | "conversation_created" => {
                let payload: Value = serde_json::from_str(&event.data)
                    .map_err(|e| AskError::Parse(format!("{} event payload: {e}", event.event)))?;
                let Value::Object(fields) = payload else {
                    return Err(AskError::Parse(format!(
                        "{} event payload is not a JSON object",
                        event.event
                    )));
                };
                merged.extend(fields);
            }
            "message" => {
                let payload: Value = serde_json::from_str(&event.data)
                    .map_err(|e| AskError::Parse(format!("message event payload: {e}")))?;
                let fragment = payload
                    .get("data")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                fragments.push(fragment.to_string());
            }
            _ => {}
        }
    }

    let conversation_id = merged
        .get("conversation_id")
        .and_then(Value::as_str)
        .map(String::from)
        .or_else(|| fallback_conversation_id.map(String::from));
    let message_id = merged
        .get("message_id")
        .and_then(Value::as_str)
        .map(String::from);

    Ok(AskResponse {
        message: fragments.concat(),
        conversation_id,
        message_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn events(items: Vec<SseEvent>) -> impl Stream<Item = Result<SseEvent>> {
        stream::iter(items.into_iter().map(Ok))
    }

    #[tokio::test]
    async fn fragments_join_in_order_and_metadata_merges() {
        let resp = aggregate(
            events(vec![
                SseEvent::new("message", r#"{"data":"Hel"}"#),
                SseEvent::new("message", r#"{"data":"lo"}"#),
                SseEvent::new("metadata", r#"{"conversation_id":"c1","message_id":"m1"}"#),
            ]),
            None,
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.message, "Hello");
        assert_eq!(resp.conversation_id.as_deref(), Some("c1"));
        assert_eq!(resp.message_id.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn error_event_short_circuits_without_partial_text() {
        let result = aggregate(
            events(vec![
                SseEvent::new("message", r#"{"data":"partial"}"#),
                SseEvent::new("error", r#"{"reason":"x"}"#),
            ]),
            None,
        )
        .await;

        match result {
            Err(AskError::Upstream(payload)) => {
                assert_eq!(payload["reason"], "x");
            }
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn conversation_id_falls_back_to_caller_supplied() {
        let resp = aggregate(
            events(vec![SseEvent::new("message", r#"{"data":"hi"}"#)]),
            Some("carried-over"),
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.conversation_id.as_deref(), Some("carried-over"));
    }

    #[tokio::test]
    async fn metadata_overrides_fallback_conversation_id() {
        let resp = aggregate(
            events(vec![
                SseEvent::new("conversation_created", r#"{"conversation_id":"fresh"}"#),
                SseEvent::new("message", r#"{"data":"hi"}"#),
            ]),
            Some("stale"),
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.conversation_id.as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn later_metadata_overwrites_earlier_fields() {
        let resp = aggregate(
            events(vec![
                SseEvent::new("conversation_created", r#"{"conversation_id":"a"}"#),
                SseEvent::new("metadata", r#"{"conversation_id":"b","message_id":"m9"}"#),
            ]),
            None,
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.conversation_id.as_deref(), Some("b"));
        assert_eq!(resp.message_id.as_deref(), Some("m9"));
    }

    #[tokio::test]
    async fn unknown_event_kinds_are_ignored() {
        let resp = aggregate(
            events(vec![
                SseEvent::new("ping", "{}"),
                SseEvent::new("message", r#"{"data":"ok"}"#),
                SseEvent::new("usage", r#"{"tokens": 12}"#),
            ]),
            None,
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.message, "ok");
    }

    #[tokio::test]
    async fn message_without_data_field_contributes_empty_fragment() {
        let resp = aggregate(
            events(vec![
                SseEvent::new("message", "{}"),
                SseEvent::new("message", r#"{"data":"tail"}"#),
            ]),
            None,
        )
        .await
        .expect("aggregation should succeed");

        assert_eq!(resp.message, "tail");
    }

    #[tokio::test]
    async fn malformed_message_payload_is_a_parse_error() {
        let result = aggregate(
            events(vec![SseEvent::new("message", "not-json")]),
            None,
        )
        .await;
        assert!(matches!(result, Err(AskError::Parse(_))));
    }

    #[tokio::test]
    async fn non_object_metadata_is_a_parse_error() {
        let result = aggregate(
            events(vec![SseEvent::new("metadata", r#"["not","an","object"]"#)]),
            None,
        )
        .await;
        assert!(matches!(result, Err(AskError::Parse(_))));
    }
}
