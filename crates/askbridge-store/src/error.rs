use thiserror::Error;

/// Errors that can occur during user-record operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists for this WhatsApp id.
    #[error("user not found: {wa_id}")]
    NotFound { wa_id: String },

    /// A SQLite operation failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
