//! PostgreSQL mention repository
//!
//! Manages a bounded sqlx connection pool, ensures the schema at startup
//! and implements the [`MentionStore`] contract with index-backed queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use super::{MentionStore, RecordOutcome};
use crate::config::DatabaseConfig;
use crate::error::AppResult;
use crate::models::{MentionAggregate, TokenMatch, TrendingToken};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS contract_mentions (
    id              BIGSERIAL       PRIMARY KEY,
    contract        TEXT            NOT NULL,
    chain           TEXT            NOT NULL,
    chat_id         BIGINT          NOT NULL,
    message_id      BIGINT          NOT NULL,
    mentioned_at    TIMESTAMPTZ     NOT NULL DEFAULT NOW(),
    UNIQUE (contract, chat_id, message_id)
);

CREATE INDEX IF NOT EXISTS idx_mentions_contract_time
    ON contract_mentions (contract, mentioned_at);

CREATE INDEX IF NOT EXISTS idx_mentions_contract_chat_time
    ON contract_mentions (contract, chat_id, mentioned_at);

CREATE INDEX IF NOT EXISTS idx_mentions_chain_time
    ON contract_mentions (chain, mentioned_at);

CREATE TABLE IF NOT EXISTS alert_history (
    id              BIGSERIAL           PRIMARY KEY,
    contract        TEXT                NOT NULL,
    chain           TEXT                NOT NULL,
    score           DOUBLE PRECISION    NOT NULL,
    mentions        INTEGER             NOT NULL,
    unique_chats    INTEGER             NOT NULL,
    velocity        DOUBLE PRECISION    NOT NULL,
    alerted_at      TIMESTAMPTZ         NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_alerts_contract_time
    ON alert_history (contract, alerted_at)
"#;

const TRENDING_SQL: &str = r#"
SELECT contract, chain,
       COUNT(*)                  AS mentions,
       COUNT(DISTINCT chat_id)   AS unique_chats,
       MIN(mentioned_at)         AS first_seen,
       MAX(mentioned_at)         AS last_seen
FROM contract_mentions
WHERE mentioned_at >= $1
GROUP BY contract, chain
HAVING COUNT(*) >= $2
   AND COUNT(DISTINCT chat_id) >= $3
"#;

const TRENDING_BY_CHAIN_SQL: &str = r#"
SELECT contract, chain,
       COUNT(*)                  AS mentions,
       COUNT(DISTINCT chat_id)   AS unique_chats,
       MIN(mentioned_at)         AS first_seen,
       MAX(mentioned_at)         AS last_seen
FROM contract_mentions
WHERE mentioned_at >= $1
  AND chain = $2
GROUP BY contract, chain
HAVING COUNT(*) >= $3
   AND COUNT(DISTINCT chat_id) >= $4
"#;

type AggregateRow = (String, String, i64, i64, DateTime<Utc>, DateTime<Utc>);

/// sqlx-backed PostgreSQL storage with a bounded connection pool.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Connect, ensure the schema and return a ready repository.
    ///
    /// Connect-time failures (unreachable host, bad credentials, schema
    /// rejection) are fatal; the caller aborts startup.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min)
            .max_connections(config.pool_max)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let repo = Self { pool };
        repo.ensure_schema().await?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            pool_min = config.pool_min,
            pool_max = config.pool_max,
            "PostgreSQL pool created and schema ensured"
        );

        Ok(repo)
    }

    async fn ensure_schema(&self) -> AppResult<()> {
        for statement in SCHEMA.split(';') {
            let stmt = statement.trim();
            if stmt.is_empty() {
                continue;
            }
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl MentionStore for PostgresRepository {
    async fn is_healthy(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }

    async fn record_mention(&self, m: &TokenMatch) -> AppResult<RecordOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO contract_mentions
                (contract, chain, chat_id, message_id, mentioned_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (contract, chat_id, message_id) DO NOTHING
            "#,
        )
        .bind(&m.contract)
        .bind(&m.chain)
        .bind(m.chat_id)
        .bind(m.message_id)
        .bind(m.observed_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(RecordOutcome::Duplicate),
            Ok(_) => Ok(RecordOutcome::Inserted),
            // Raced past ON CONFLICT; still a duplicate, not an error
            Err(e) if is_unique_violation(&e) => Ok(RecordOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    async fn trending(
        &self,
        since: DateTime<Utc>,
        min_mentions: i64,
        min_unique_chats: i64,
        chain: Option<&str>,
    ) -> AppResult<Vec<MentionAggregate>> {
        let rows: Vec<AggregateRow> = match chain {
            Some(chain) => {
                sqlx::query_as(TRENDING_BY_CHAIN_SQL)
                    .bind(since)
                    .bind(chain)
                    .bind(min_mentions)
                    .bind(min_unique_chats)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as(TRENDING_SQL)
                    .bind(since)
                    .bind(min_mentions)
                    .bind(min_unique_chats)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows
            .into_iter()
            .map(
                |(contract, chain, mentions, unique_chats, first_seen, last_seen)| {
                    MentionAggregate {
                        contract,
                        chain,
                        mentions,
                        unique_chats,
                        first_seen,
                        last_seen,
                    }
                },
            )
            .collect())
    }

    async fn mention_count(
        &self,
        contract: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM contract_mentions
            WHERE contract = $1
              AND mentioned_at >= $2
              AND mentioned_at < $3
            "#,
        )
        .bind(contract)
        .bind(since)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let done = sqlx::query("DELETE FROM contract_mentions WHERE mentioned_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await?;

        let deleted = done.rows_affected();
        if deleted > 0 {
            info!(deleted, "Purged old mentions");
        }
        Ok(deleted)
    }

    async fn record_alert(
        &self,
        token: &TrendingToken,
        alerted_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO alert_history
                (contract, chain, score, mentions, unique_chats, velocity, alerted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&token.contract)
        .bind(&token.chain)
        .bind(token.score)
        .bind(token.mentions as i32)
        .bind(token.unique_chats as i32)
        .bind(token.velocity)
        .bind(alerted_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_enforces_mention_identity() {
        assert!(SCHEMA.contains("UNIQUE (contract, chat_id, message_id)"));
    }

    #[test]
    fn test_schema_statements_are_well_formed() {
        let statements: Vec<&str> = SCHEMA
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        // Two tables plus four indexes
        assert_eq!(statements.len(), 6);
        for stmt in statements {
            assert!(stmt.starts_with("CREATE TABLE") || stmt.starts_with("CREATE INDEX"));
        }
    }
}
