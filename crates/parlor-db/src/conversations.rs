use parlor_types::models::ConversationSummary;

use crate::error::Result;
use crate::{Database, collect_rows, micros_to_time};

/// Latest message per correspondent of ?1, newest conversation first.
///
/// `peer` folds both directions onto the other participant. Within a peer the
/// newest `sent_at` wins and an exact tie goes to the lowest rowid (earliest
/// insert). Peers whose latest activity ties are ordered by username.
const CONVERSATIONS_SQL: &str = "
    WITH mine AS (
        SELECT
            rowid AS seq,
            CASE WHEN from_acc = ?1 THEN to_acc ELSE from_acc END AS peer,
            body,
            sent_at
        FROM messages
        WHERE from_acc = ?1 OR to_acc = ?1
    ),
    ranked AS (
        SELECT
            peer,
            body,
            sent_at,
            ROW_NUMBER() OVER (PARTITION BY peer ORDER BY sent_at DESC, seq ASC) AS rn
        FROM mine
    )
    SELECT peer, body, sent_at
    FROM ranked
    WHERE rn = 1
    ORDER BY sent_at DESC, peer ASC";

impl Database {
    /// One summary per distinct correspondent of `username`. An account with
    /// no messages gets an empty list.
    pub fn conversation_summaries(&self, username: &str) -> Result<Vec<ConversationSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(CONVERSATIONS_SQL)?;
            let rows = stmt.query_map([username], |row| {
                Ok(ConversationSummary {
                    peer_username: row.get(0)?,
                    last_message_body: row.get(1)?,
                    last_message_time: micros_to_time(2, row.get(2)?)?,
                })
            })?;
            collect_rows(rows, "conversation")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{insert_raw, open_temp, seed_accounts};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn peers(summaries: &[ConversationSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.peer_username.as_str()).collect()
    }

    #[test]
    fn one_entry_per_peer_with_latest_body() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice", "bob"]);

        db.append_message("alice", "bob", "hi", at(1)).unwrap();
        db.append_message("bob", "alice", "hey", at(2)).unwrap();

        let summaries = db.conversation_summaries("alice").unwrap();
        assert_eq!(
            summaries,
            vec![ConversationSummary {
                peer_username: "bob".into(),
                last_message_body: "hey".into(),
                last_message_time: at(2),
            }]
        );

        // Same conversation seen from the other side
        let from_bob = db.conversation_summaries("bob").unwrap();
        assert_eq!(peers(&from_bob), vec!["alice"]);
        assert_eq!(from_bob[0].last_message_body, "hey");
    }

    #[test]
    fn ordered_by_latest_activity() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice", "bob", "carol", "dave"]);

        db.append_message("alice", "bob", "b1", at(1)).unwrap();
        db.append_message("carol", "alice", "c1", at(2)).unwrap();
        db.append_message("alice", "dave", "d1", at(3)).unwrap();
        db.append_message("bob", "alice", "b2", at(4)).unwrap();
        // Not involving alice
        db.append_message("carol", "dave", "x", at(9)).unwrap();

        let summaries = db.conversation_summaries("alice").unwrap();
        assert_eq!(peers(&summaries), vec!["bob", "dave", "carol"]);
        assert_eq!(summaries[0].last_message_body, "b2");
        assert_eq!(summaries[2].last_message_time, at(2));
    }

    #[test]
    fn timestamp_tie_within_peer_picks_earliest_insert() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice", "bob"]);

        db.append_message("alice", "bob", "older", at(0)).unwrap();
        insert_raw(&db, "alice", "bob", "first", at(7));
        insert_raw(&db, "bob", "alice", "second", at(7));

        let summaries = db.conversation_summaries("alice").unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].last_message_body, "first");
    }

    #[test]
    fn timestamp_tie_across_peers_orders_by_name() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice", "zed", "bob"]);

        insert_raw(&db, "alice", "zed", "z", at(3));
        insert_raw(&db, "alice", "bob", "b", at(3));

        let summaries = db.conversation_summaries("alice").unwrap();
        assert_eq!(peers(&summaries), vec!["bob", "zed"]);
    }

    #[test]
    fn repeated_calls_are_identical() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice", "bob", "carol"]);

        db.append_message("alice", "bob", "1", at(1)).unwrap();
        db.append_message("carol", "alice", "2", at(1)).unwrap();
        db.append_message("bob", "alice", "3", at(2)).unwrap();

        let first = db.conversation_summaries("alice").unwrap();
        let second = db.conversation_summaries("alice").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_messages_is_empty() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice"]);

        assert!(db.conversation_summaries("alice").unwrap().is_empty());
    }

    #[test]
    fn note_to_self_is_its_own_conversation() {
        let (_dir, db) = open_temp();
        seed_accounts(&db, &["alice"]);

        db.append_message("alice", "alice", "remember milk", at(1)).unwrap();

        let summaries = db.conversation_summaries("alice").unwrap();
        assert_eq!(peers(&summaries), vec!["alice"]);
    }
}
