use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A direct message between two accounts. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// One correspondent of an account with the latest message exchanged with them.
/// Derived from the message table, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub peer_username: String,
    pub last_message_body: String,
    pub last_message_time: DateTime<Utc>,
}
