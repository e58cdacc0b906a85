use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::types::UserRecord;

/// Thread-safe store for persisted user records.
///
/// Wraps a single SQLite connection in a `Mutex`. Sufficient for the
/// single-node deployment target; concurrent messages from the same user are
/// last-writer-wins by design.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Retrieve a record by WhatsApp id, returning `None` if absent.
    #[instrument(skip(self), fields(wa_id))]
    pub fn get(&self, wa_id: &str) -> Result<Option<UserRecord>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT wa_id, username, conversation_id, last_interaction
             FROM users WHERE wa_id = ?1",
            rusqlite::params![wa_id],
            row_to_record,
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    /// Create the first-contact record: no conversation id, timer set to `now`.
    ///
    /// Uses INSERT OR IGNORE plus read-back so a concurrent first message from
    /// the same user cannot duplicate the row.
    #[instrument(skip(self), fields(wa_id))]
    pub fn create(
        &self,
        wa_id: &str,
        username: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<UserRecord> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT OR IGNORE INTO users (wa_id, username, conversation_id, last_interaction)
             VALUES (?1, ?2, NULL, ?3)",
            rusqlite::params![wa_id, username, now.to_rfc3339()],
        )?;
        debug!("user record created");

        let record = db.query_row(
            "SELECT wa_id, username, conversation_id, last_interaction
             FROM users WHERE wa_id = ?1",
            rusqlite::params![wa_id],
            row_to_record,
        )?;
        Ok(record)
    }

    /// Commit the outcome of a successful exchange: new conversation id,
    /// refreshed display name and timer.
    #[instrument(skip(self), fields(wa_id))]
    pub fn record_exchange(
        &self,
        wa_id: &str,
        username: Option<&str>,
        conversation_id: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute(
            "UPDATE users
             SET conversation_id  = ?1,
                 username         = ?2,
                 last_interaction = ?3
             WHERE wa_id = ?4",
            rusqlite::params![conversation_id, username, at.to_rfc3339(), wa_id],
        )?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound {
                wa_id: wa_id.to_string(),
            });
        }
        Ok(())
    }

    /// `/new` — drop the active conversation and restart the idle timer.
    #[instrument(skip(self), fields(wa_id))]
    pub fn reset_conversation(
        &self,
        wa_id: &str,
        username: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let db = self.db.lock().unwrap();
        let rows_changed = db.execute(
            "UPDATE users
             SET conversation_id  = NULL,
                 username         = ?1,
                 last_interaction = ?2
             WHERE wa_id = ?3",
            rusqlite::params![username, at.to_rfc3339(), wa_id],
        )?;
        if rows_changed == 0 {
            return Err(StoreError::NotFound {
                wa_id: wa_id.to_string(),
            });
        }
        Ok(())
    }
}

/// Map a SQLite row to a `UserRecord`.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    let ts: String = row.get(3)?;
    let last_interaction = DateTime::parse_from_rfc3339(&ts)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(UserRecord {
        wa_id: row.get(0)?,
        username: row.get(1)?,
        conversation_id: row.get(2)?,
        last_interaction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn store() -> UserStore {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        crate::db::init_db(&conn).expect("init schema");
        UserStore::new(conn)
    }

    #[test]
    fn get_missing_user_returns_none() {
        let store = store();
        assert!(store.get("15550001111").expect("query").is_none());
    }

    #[test]
    fn create_sets_null_conversation_and_timestamp() {
        let store = store();
        let now = Utc::now();
        let record = store
            .create("15550001111", Some("Ada"), now)
            .expect("create");

        assert_eq!(record.wa_id, "15550001111");
        assert_eq!(record.username.as_deref(), Some("Ada"));
        assert!(record.conversation_id.is_none());
        assert_eq!(record.last_interaction.timestamp(), now.timestamp());
    }

    #[test]
    fn create_twice_keeps_one_row() {
        let store = store();
        let now = Utc::now();
        store.create("1555", Some("Ada"), now).expect("first");
        let later = now + Duration::minutes(5);
        let record = store.create("1555", Some("Ada"), later).expect("second");

        // INSERT OR IGNORE — the original row wins.
        assert_eq!(record.last_interaction.timestamp(), now.timestamp());
    }

    #[test]
    fn record_exchange_updates_all_fields() {
        let store = store();
        let now = Utc::now();
        store.create("1555", None, now).expect("create");

        let later = now + Duration::minutes(2);
        store
            .record_exchange("1555", Some("Ada L."), Some("conv-9"), later)
            .expect("update");

        let record = store.get("1555").expect("query").expect("present");
        assert_eq!(record.conversation_id.as_deref(), Some("conv-9"));
        assert_eq!(record.username.as_deref(), Some("Ada L."));
        assert_eq!(record.last_interaction.timestamp(), later.timestamp());
    }

    #[test]
    fn reset_conversation_clears_reference_and_refreshes_timer() {
        let store = store();
        let now = Utc::now();
        store.create("1555", Some("Ada"), now).expect("create");
        store
            .record_exchange("1555", Some("Ada"), Some("conv-1"), now)
            .expect("update");

        let later = now + Duration::minutes(10);
        store
            .reset_conversation("1555", Some("Ada"), later)
            .expect("reset");

        let record = store.get("1555").expect("query").expect("present");
        assert!(record.conversation_id.is_none());
        assert_eq!(record.last_interaction.timestamp(), later.timestamp());
    }

    #[test]
    fn updating_unknown_user_is_not_found() {
        let store = store();
        let result = store.record_exchange("nobody", None, Some("c"), Utc::now());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn timestamps_round_trip_with_timezone() {
        let store = store();
        let now = Utc::now();
        store.create("1555", None, now).expect("create");
        let record = store.get("1555").expect("query").expect("present");
        // RFC3339 storage preserves the instant to the second or better.
        assert!((record.last_interaction - now).num_seconds().abs() <= 1);
    }
}
