//! Storage layer for contract mentions
//!
//! The [`MentionStore`] trait is the narrow contract the rest of the
//! pipeline consumes; [`PostgresRepository`] is the production backend.
//! Dedup is enforced by the store itself, never by callers: the mention
//! table carries a uniqueness constraint over
//! `(contract, chat_id, message_id)`.

mod postgres;

pub use postgres::PostgresRepository;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{MentionAggregate, TokenMatch, TrendingToken};

/// Outcome of one mention insert.
///
/// A duplicate is not an error; callers count it separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new row was written
    Inserted,
    /// The (contract, chat_id, message_id) triple was already recorded
    Duplicate,
}

/// Contract for all mention storage backends.
#[async_trait]
pub trait MentionStore: Send + Sync {
    /// Fast liveness probe for the health surface.
    async fn is_healthy(&self) -> bool;

    /// Persist one mention idempotently.
    async fn record_mention(&self, m: &TokenMatch) -> AppResult<RecordOutcome>;

    /// Contracts with at least `min_mentions` total mentions and
    /// `min_unique_chats` distinct chats in the window starting at `since`,
    /// optionally restricted to one chain. Ordering of the result is
    /// unspecified; ranking is the trending engine's job.
    async fn trending(
        &self,
        since: DateTime<Utc>,
        min_mentions: i64,
        min_unique_chats: i64,
        chain: Option<&str>,
    ) -> AppResult<Vec<MentionAggregate>>;

    /// Total mentions for one contract in the half-open range
    /// `[since, until)`.
    async fn mention_count(
        &self,
        contract: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<i64>;

    /// Delete all mentions observed before `before`; returns the number of
    /// rows removed.
    async fn purge_before(&self, before: DateTime<Utc>) -> AppResult<u64>;

    /// Append one emitted alert to the audit history.
    async fn record_alert(&self, token: &TrendingToken, alerted_at: DateTime<Utc>)
        -> AppResult<()>;

    /// Release all connections.
    async fn close(&self);
}
