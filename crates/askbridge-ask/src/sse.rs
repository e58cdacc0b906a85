//! Server-sent-event decoding for the Ask streaming endpoint.
//!
//! The response body is a byte stream of SSE frames:
//! `event: <name>\ndata: <json>\n\n`. Chunk boundaries do not align with
//! line boundaries, so a carry-over buffer keeps the trailing partial line
//! between reads.

use futures_util::{Stream, StreamExt};

use crate::error::{AskError, Result};

/// One decoded server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name from the `event:` field ("message" when omitted, per SSE).
    pub event: String,
    /// Joined `data:` payload lines.
    pub data: String,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// A single parsed SSE field line.
enum SseField {
    Event(String),
    Data(String),
}

/// Parse one non-blank SSE line. Comments (`:`) and unknown fields yield `None`.
fn parse_sse_field(line: &str) -> Option<SseField> {
    if let Some(name) = line.strip_prefix("event:") {
        return Some(SseField::Event(strip_field_space(name).to_string()));
    }
    line.strip_prefix("data:")
        .map(|data| SseField::Data(strip_field_space(data).to_string()))
}

/// SSE allows one optional space after the field colon.
fn strip_field_space(value: &str) -> &str {
    value.strip_prefix(' ').unwrap_or(value)
}

/// Decode a streaming HTTP response body into a lazy sequence of events.
///
/// Single-pass and not restartable — the caller's reduction loop pulls events
/// one at a time. A transport failure mid-stream surfaces as the final item.
pub fn event_stream(resp: reqwest::Response) -> impl Stream<Item = Result<SseEvent>> {
    async_stream::stream! {
        let mut byte_stream = resp.bytes_stream();
        let mut line_buf: Vec<u8> = Vec::new();
        let mut event_name = String::new();
        let mut data_lines: Vec<String> = Vec::new();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err(AskError::Http(e));
                    return;
                }
            };
            line_buf.extend_from_slice(&chunk);

            // Consume every complete line; the trailing partial stays
            // buffered, so a UTF-8 sequence torn across chunks reassembles.
            while let Some(pos) = line_buf.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = line_buf.drain(..=pos).collect();
                let raw = String::from_utf8_lossy(&raw);
                let line = raw.trim_end_matches(['\n', '\r']);

                if line.is_empty() {
                    if let Some(event) = flush(&mut event_name, &mut data_lines) {
                        yield Ok(event);
                    }
                    continue;
                }

                match parse_sse_field(line) {
                    Some(SseField::Event(name)) => event_name = name,
                    Some(SseField::Data(data)) => data_lines.push(data),
                    None => {}
                }
            }
        }

        // Stream ended without a final blank line — flush what accumulated.
        if let Some(event) = flush(&mut event_name, &mut data_lines) {
            yield Ok(event);
        }
    }
}

/// Emit the pending frame, if any. The event name defaults to "message".
fn flush(event_name: &mut String, data_lines: &mut Vec<String>) -> Option<SseEvent> {
    if event_name.is_empty() && data_lines.is_empty() {
        return None;
    }
    let name = if event_name.is_empty() {
        "message".to_string()
    } else {
        std::mem::take(event_name)
    };
    let data = data_lines.join("\n");
    data_lines.clear();
    Some(SseEvent { event: name, data })
}
