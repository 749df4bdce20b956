//! Trending detection engine
//!
//! Periodically turns windowed mention aggregates into scored, per-chain
//! ranked trending tokens:
//! - velocity compares the current window with the previous window of the
//!   same length
//! - score = mentions * 2 + unique_chats * 3 + velocity * 5
//! - the optional liquidity filter fails open

use chrono::{Duration, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::TrendingConfig;
use crate::error::AppResult;
use crate::models::TrendingToken;
use crate::oracle::{LiquidityOracle, LiquidityVerdict};
use crate::storage::MentionStore;

pub struct TrendingEngine {
    store: Arc<dyn MentionStore>,
    oracle: Option<Arc<dyn LiquidityOracle>>,
    config: TrendingConfig,
}

impl TrendingEngine {
    pub fn new(
        store: Arc<dyn MentionStore>,
        oracle: Option<Arc<dyn LiquidityOracle>>,
        config: TrendingConfig,
    ) -> Self {
        Self {
            store,
            oracle,
            config,
        }
    }

    /// Run one trending scan and return ranked tokens.
    ///
    /// A repository error aborts the whole scan; the caller logs it and
    /// retries on the next tick. An oracle failure never does.
    pub async fn scan(&self) -> AppResult<Vec<TrendingToken>> {
        let now = Utc::now();
        let window = Duration::minutes(self.config.window_minutes);
        let since = now - window;
        let prior_since = since - window;

        let aggregates = self
            .store
            .trending(
                since,
                self.config.min_mentions,
                self.config.min_unique_chats,
                None,
            )
            .await?;

        if aggregates.is_empty() {
            return Ok(Vec::new());
        }

        let mut tokens = Vec::with_capacity(aggregates.len());
        for aggregate in aggregates {
            let previous = self
                .store
                .mention_count(&aggregate.contract, prior_since, since)
                .await?;

            let current = aggregate.mentions;
            let velocity = if previous == 0 {
                current as f64
            } else {
                (current - previous) as f64 / previous as f64
            };

            let mut token = TrendingToken {
                contract: aggregate.contract,
                chain: aggregate.chain,
                mentions: current,
                unique_chats: aggregate.unique_chats,
                velocity,
                score: 0.0,
            };
            token.compute_score();
            tokens.push(token);
        }

        if let Some(oracle) = &self.oracle {
            tokens = filter_by_liquidity(oracle.as_ref(), tokens).await;
        }

        let ranked = rank_per_chain(tokens);

        if !ranked.is_empty() {
            let top: Vec<String> = ranked
                .iter()
                .take(5)
                .map(|t| {
                    format!(
                        "{}.. ({} s={:.1})",
                        &t.contract[..t.contract.len().min(8)],
                        t.chain,
                        t.score
                    )
                })
                .collect();
            info!(count = ranked.len(), top = %top.join(", "), "Trending tokens detected");
        }

        Ok(ranked)
    }
}

/// Drop candidates the oracle judges illiquid; keep everything it cannot
/// judge.
async fn filter_by_liquidity(
    oracle: &dyn LiquidityOracle,
    tokens: Vec<TrendingToken>,
) -> Vec<TrendingToken> {
    let mut passed = Vec::with_capacity(tokens.len());
    for token in tokens {
        match oracle.check(&token.contract).await {
            LiquidityVerdict::Insufficient => {
                debug!(contract = %token.contract, "Filtered out, below liquidity threshold");
            }
            LiquidityVerdict::Sufficient | LiquidityVerdict::Unavailable => passed.push(token),
        }
    }
    passed
}

/// Group tokens by chain and sort each group by score descending, with
/// mention count, unique chats and contract string as tie-breaks. Rankings
/// never cross chains.
fn rank_per_chain(tokens: Vec<TrendingToken>) -> Vec<TrendingToken> {
    let mut by_chain: BTreeMap<String, Vec<TrendingToken>> = BTreeMap::new();
    for token in tokens {
        by_chain.entry(token.chain.clone()).or_default().push(token);
    }

    let mut ranked = Vec::new();
    for (_, mut group) in by_chain {
        group.sort_by(compare_tokens);
        ranked.extend(group);
    }
    ranked
}

fn compare_tokens(a: &TrendingToken, b: &TrendingToken) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.mentions.cmp(&a.mentions))
        .then_with(|| b.unique_chats.cmp(&a.unique_chats))
        .then_with(|| a.contract.cmp(&b.contract))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(contract: &str, chain: &str, mentions: i64, unique: i64, score: f64) -> TrendingToken {
        TrendingToken {
            contract: contract.to_string(),
            chain: chain.to_string(),
            mentions,
            unique_chats: unique,
            velocity: 0.0,
            score,
        }
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let ranked = rank_per_chain(vec![
            token("a", "evm", 3, 2, 10.0),
            token("b", "evm", 3, 2, 30.0),
            token("c", "evm", 3, 2, 20.0),
        ]);
        let order: Vec<&str> = ranked.iter().map(|t| t.contract.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_rank_tie_breaks() {
        // Equal scores: more mentions wins, then more unique chats, then
        // contract ascending.
        let ranked = rank_per_chain(vec![
            token("d", "evm", 2, 2, 20.0),
            token("c", "evm", 2, 2, 20.0),
            token("b", "evm", 2, 3, 20.0),
            token("a", "evm", 3, 1, 20.0),
        ]);
        let order: Vec<&str> = ranked.iter().map(|t| t.contract.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_rank_never_interleaves_chains() {
        let ranked = rank_per_chain(vec![
            token("s1", "solana", 3, 2, 5.0),
            token("e1", "evm", 3, 2, 50.0),
            token("s2", "solana", 3, 2, 99.0),
        ]);
        let chains: Vec<&str> = ranked.iter().map(|t| t.chain.as_str()).collect();
        assert_eq!(chains, vec!["evm", "solana", "solana"]);
        assert_eq!(ranked[1].contract, "s2");
    }
}
