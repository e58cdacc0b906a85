pub mod config;
pub mod error;
pub mod session;

pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use session::should_reset;
