use thiserror::Error;

/// Errors from the Ask streaming backend.
///
/// `Upstream` carries the decoded payload of an in-band `error` event —
/// the backend accepted the request but rejected the query. `Api` and `Http`
/// are transport-level: the stream never opened or died mid-read.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ask API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Ask backend rejected the query: {0}")]
    Upstream(serde_json::Value),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, AskError>;
