use thiserror::Error;

/// Errors produced by the WhatsApp Cloud API client.
#[derive(Debug, Error)]
pub enum WaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Structured Graph API error — every diagnostic field Meta returns.
    #[error("Graph API error {code}: {message}")]
    Api {
        code: i64,
        subcode: Option<i64>,
        kind: String,
        message: String,
        is_transient: Option<bool>,
        fbtrace_id: Option<String>,
    },

    #[error("unexpected Graph response ({status}): {body}")]
    Unexpected { status: u16, body: String },
}
