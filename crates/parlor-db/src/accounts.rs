use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::AccountRow;
use crate::{Database, collect_rows};

impl Database {
    /// Insert a new account. A taken username surfaces as `StoreError::Conflict`
    /// via the primary key, so there is no separate existence check to race.
    pub fn create_account(&self, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO accounts (username, password_hash) VALUES (?1, ?2)",
                (username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_account(&self, username: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_account(conn, username))
    }

    pub fn account_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?1)",
                [username],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Every username, alphabetically.
    pub fn list_usernames(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT username FROM accounts ORDER BY username")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            collect_rows(rows, "account")
        })
    }

    /// Case-insensitive substring match on usernames, every match returned.
    /// The fragment is matched literally; an empty fragment matches everyone.
    pub fn search_usernames(&self, fragment: &str) -> Result<Vec<String>> {
        if fragment.is_empty() {
            return self.list_usernames();
        }

        let needle = fragment.to_lowercase();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username FROM accounts
                 WHERE instr(fold_case(username), ?1) > 0
                 ORDER BY username",
            )?;
            let rows = stmt.query_map([needle], |row| row.get::<_, String>(0))?;
            collect_rows(rows, "account")
        })
    }
}

fn query_account(conn: &Connection, username: &str) -> Result<Option<AccountRow>> {
    let row = conn
        .query_row(
            "SELECT username, password_hash FROM accounts WHERE username = ?1",
            [username],
            |row| {
                Ok(AccountRow {
                    username: row.get(0)?,
                    password_hash: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(row)
}
