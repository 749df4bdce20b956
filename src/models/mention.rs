//! Mention detection and aggregation types

use chrono::{DateTime, Utc};

/// A single contract detection result from one message.
///
/// Produced by a chain detector and persisted by the repository within the
/// same ingestion turn. `observed_at` is the detection time, not the
/// message's own timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMatch {
    /// Chain-normalized contract identifier
    pub contract: String,
    /// Canonical chain name of the detector that produced the match
    pub chain: String,
    /// Chat, group or channel the message belongs to
    pub chat_id: i64,
    /// Message id within the chat
    pub message_id: i64,
    /// UTC instant of detection
    pub observed_at: DateTime<Utc>,
}

/// Windowed aggregate for one contract, computed per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionAggregate {
    pub contract: String,
    pub chain: String,
    /// Total mentions inside the window
    pub mentions: i64,
    /// Distinct chats inside the window
    pub unique_chats: i64,
    /// Earliest mention inside the window
    pub first_seen: DateTime<Utc>,
    /// Latest mention inside the window
    pub last_seen: DateTime<Utc>,
}
