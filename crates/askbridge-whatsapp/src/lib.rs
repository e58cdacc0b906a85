pub mod client;
pub mod commands;
pub mod error;
pub mod format;
pub mod handler;
pub mod send;
pub mod typing;
pub mod webhook;

pub use client::{ChatTransport, WaClient};
pub use error::WaError;
pub use handler::{process_message, BridgeContext};
pub use webhook::InboundMessage;
