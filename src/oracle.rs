//! Dexscreener liquidity oracle
//!
//! Optional validation step for trending candidates. The oracle fails
//! open: a timeout, transport error or unknown token keeps the candidate.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DexscreenerConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of one liquidity lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiquidityVerdict {
    /// At least one pair meets the threshold
    Sufficient,
    /// Pairs exist but none meets the threshold
    Insufficient,
    /// Lookup failed or the token has no listed pairs; callers fail open
    Unavailable,
}

/// Liquidity lookup contract consumed by the trending engine.
#[async_trait]
pub trait LiquidityOracle: Send + Sync {
    async fn check(&self, contract: &str) -> LiquidityVerdict;
}

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    #[serde(default)]
    pairs: Option<Vec<PairInfo>>,
}

#[derive(Debug, Deserialize)]
struct PairInfo {
    #[serde(default)]
    liquidity: Option<PairLiquidity>,
}

#[derive(Debug, Deserialize)]
struct PairLiquidity {
    #[serde(default)]
    usd: Option<f64>,
}

/// Dexscreener-backed liquidity oracle.
pub struct DexscreenerOracle {
    client: reqwest::Client,
    api_url: String,
    min_liquidity_usd: f64,
}

impl DexscreenerOracle {
    pub fn new(config: &DexscreenerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            min_liquidity_usd: config.min_liquidity,
        }
    }

    fn classify(&self, response: &TokenPairsResponse) -> LiquidityVerdict {
        let pairs = match response.pairs.as_deref() {
            Some(pairs) if !pairs.is_empty() => pairs,
            // Not listed yet; nothing to judge against
            _ => return LiquidityVerdict::Unavailable,
        };

        let sufficient = pairs.iter().any(|pair| {
            pair.liquidity
                .as_ref()
                .and_then(|l| l.usd)
                .is_some_and(|usd| usd >= self.min_liquidity_usd)
        });

        if sufficient {
            LiquidityVerdict::Sufficient
        } else {
            LiquidityVerdict::Insufficient
        }
    }
}

#[async_trait]
impl LiquidityOracle for DexscreenerOracle {
    async fn check(&self, contract: &str) -> LiquidityVerdict {
        let url = format!("{}/{}", self.api_url, contract);

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, contract, "Dexscreener lookup failed, passing through");
                return LiquidityVerdict::Unavailable;
            }
        };

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                contract,
                "Dexscreener returned non-success, passing through"
            );
            return LiquidityVerdict::Unavailable;
        }

        match response.json::<TokenPairsResponse>().await {
            Ok(body) => {
                let verdict = self.classify(&body);
                debug!(contract, ?verdict, "Liquidity check completed");
                verdict
            }
            Err(e) => {
                warn!(error = %e, contract, "Dexscreener response unreadable, passing through");
                LiquidityVerdict::Unavailable
            }
        }
    }
}
