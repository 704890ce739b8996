use chrono::{DateTime, Utc};
use parlor_types::models::Message;
use rusqlite::Row;

use crate::error::{Result, StoreError};
use crate::{Database, collect_rows, micros_to_time};

impl Database {
    /// Append one immutable message and return the `sent_at` it was stored
    /// with.
    ///
    /// Stored timestamps strictly increase: if `sent_at` is not after the
    /// newest stored message (clock step back, same microsecond) it is moved
    /// to one microsecond past it. The clamp and the insert are one statement
    /// on the writer connection.
    ///
    /// Callers check that both accounts exist first; the foreign keys reject
    /// anything that slips past as `StoreError::NotFound`.
    pub fn append_message(
        &self,
        from: &str,
        to: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        self.with_conn_mut(|conn| {
            let stored = conn.query_row(
                "INSERT INTO messages (from_acc, to_acc, body, sent_at)
                 SELECT ?1, ?2, ?3, MAX(?4, COALESCE((SELECT MAX(sent_at) FROM messages) + 1, ?4))
                 RETURNING sent_at",
                rusqlite::params![from, to, body, sent_at.timestamp_micros()],
                |row| micros_to_time(0, row.get(0)?),
            )?;
            Ok(stored)
        })
    }

    /// Full history between two accounts, oldest first. Direction does not
    /// matter: `get_thread(a, b) == get_thread(b, a)`.
    ///
    /// An empty thread is `StoreError::NotFound`, not an empty list.
    pub fn get_thread(&self, user_a: &str, user_b: &str) -> Result<Vec<Message>> {
        let messages = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT from_acc, to_acc, body, sent_at FROM messages
                 WHERE (from_acc = ?1 AND to_acc = ?2) OR (from_acc = ?2 AND to_acc = ?1)
                 ORDER BY sent_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map([user_a, user_b], map_message)?;
            collect_rows(rows, "message")
        })?;

        if messages.is_empty() {
            return Err(StoreError::NotFound(format!(
                "no messages between {} and {}",
                user_a, user_b
            )));
        }
        Ok(messages)
    }
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        from: row.get(0)?,
        to: row.get(1)?,
        body: row.get(2)?,
        sent_at: micros_to_time(3, row.get(3)?)?,
    })
}
