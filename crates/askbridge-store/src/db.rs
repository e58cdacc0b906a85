use rusqlite::Connection;

use crate::error::Result;

/// Initialise the users table.
///
/// Safe to call on every startup — uses `IF NOT EXISTS`.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            wa_id            TEXT PRIMARY KEY,
            username         TEXT,
            conversation_id  TEXT,
            last_interaction TEXT NOT NULL
        );",
    )?;
    Ok(())
}
