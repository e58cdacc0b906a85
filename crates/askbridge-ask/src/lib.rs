pub mod aggregate;
pub mod client;
pub mod error;
pub mod sse;

pub use aggregate::{aggregate, AskResponse};
pub use client::{AskBackend, AskClient};
pub use error::{AskError, Result};
pub use sse::SseEvent;
