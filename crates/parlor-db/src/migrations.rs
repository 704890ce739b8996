use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS accounts (
            username        TEXT PRIMARY KEY,
            password_hash   TEXT NOT NULL
        );

        -- sent_at is unix microseconds; rowid records insertion order
        CREATE TABLE IF NOT EXISTS messages (
            from_acc    TEXT NOT NULL REFERENCES accounts(username),
            to_acc      TEXT NOT NULL REFERENCES accounts(username),
            body        TEXT NOT NULL,
            sent_at     INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_from
            ON messages(from_acc, sent_at);

        CREATE INDEX IF NOT EXISTS idx_messages_to
            ON messages(to_acc, sent_at);

        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(from_acc, to_acc, sent_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
