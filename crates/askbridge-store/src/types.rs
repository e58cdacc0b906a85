use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted per-user state: the active Ask conversation and the idle timer.
///
/// Exactly one row per WhatsApp id. Created on first contact with no
/// conversation id; mutated on every exchange, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    /// WhatsApp account id — primary key.
    pub wa_id: String,
    /// Last-seen display name, refreshed on every interaction.
    pub username: Option<String>,
    /// Opaque conversation reference issued by the Ask backend.
    /// `None` means the next message starts a fresh conversation.
    pub conversation_id: Option<String>,
    /// UTC instant of the last successful exchange (or `/new` reset).
    pub last_interaction: DateTime<Utc>,
}
