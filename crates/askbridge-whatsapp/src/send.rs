//! Outbound answer delivery: reformat, chunk, send in order.

use std::time::Duration;

use crate::client::ChatTransport;
use crate::error::WaError;
use crate::format::{markdown_to_whatsapp, split_for_whatsapp, MAX_MESSAGE_LEN};

/// Convert the aggregated answer to WhatsApp markup and deliver it as one or
/// more ordered messages.
///
/// A 100ms delay between consecutive chunks keeps multi-part answers in
/// order and under the platform's rate limits. A failed send aborts the
/// remainder — the caller decides whether to persist.
pub async fn send_answer<T: ChatTransport + ?Sized>(
    transport: &T,
    to: &str,
    text: &str,
) -> Result<(), WaError> {
    let formatted = markdown_to_whatsapp(text);
    let chunks = split_for_whatsapp(&formatted, MAX_MESSAGE_LEN);

    for (i, chunk) in chunks.iter().enumerate() {
        transport.send_text(to, chunk).await?;
        if i + 1 < chunks.len() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
    Ok(())
}
