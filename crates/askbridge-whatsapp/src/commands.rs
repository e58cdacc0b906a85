//! Reserved command tokens and their fixed responses.
//!
//! Matching is case-insensitive on the trimmed message text; commands never
//! reach the Ask backend.

pub const START_COMMAND: &str = "/start";
pub const NEW_COMMAND: &str = "/new";
pub const HELP_COMMAND: &str = "/help";

pub const NEW_CONVERSATION_TEXT: &str = "Started a new conversation. Ask your question.";

pub const FAILURE_TEXT: &str = "Sorry, something went wrong. Contact support.";

/// Greeting for `/start` and for a user's very first message.
pub fn welcome_text(timeout_minutes: i64) -> String {
    format!(
        "Welcome to the Ask WhatsApp bot.\n\n\
         Available commands:\n\
         \t/new to start a new conversation\n\
         \t/help to get help\n\n\
         Note: a conversation closes after {timeout_minutes} minutes without \
         activity; the next message then starts a new conversation.\n\n\
         Ask your question"
    )
}

pub fn help_text(timeout_minutes: i64) -> String {
    format!(
        "Available commands:\n\
         \t/new to start a new conversation\n\
         \t/help to get help\n\n\
         Note: a conversation closes after {timeout_minutes} minutes without \
         activity; the next message then starts a new conversation."
    )
}
