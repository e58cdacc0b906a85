//! Typing indicator — refreshed every 25 seconds while a query runs.
//!
//! WhatsApp's indicator expires after ~25 seconds, so the loop re-sends it
//! until `TypingHandle::stop()` aborts the task. Cancellation is the normal
//! shutdown path, not an error.

use std::sync::Arc;
use std::time::Duration;

use crate::client::ChatTransport;

/// Handle to a background typing indicator task.
///
/// Call `stop()` once the answer is ready (or handling failed) to abort the
/// loop.
pub struct TypingHandle(tokio::task::JoinHandle<()>);

impl TypingHandle {
    /// Spawn the typing indicator loop for the message being answered.
    ///
    /// Shows the indicator immediately, then every 25 seconds.
    pub fn start(transport: Arc<dyn ChatTransport>, message_id: String) -> Self {
        let handle = tokio::spawn(async move {
            loop {
                let _ = transport.show_typing(&message_id).await;
                tokio::time::sleep(Duration::from_secs(25)).await;
            }
        });
        TypingHandle(handle)
    }

    /// Abort the typing indicator loop.
    pub fn stop(self) {
        self.0.abort();
    }
}
