//! Solana contract address detector

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::ChainDetector;
use crate::models::TokenMatch;

const CHAIN_NAME: &str = "solana";

// Base58 alphabet (no 0, O, I, l), mint-length runs only
static BASE58_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[1-9A-HJ-NP-Za-km-z]{32,44}\b").expect("valid base58 pattern"));

// Common words that collide with the Base58 alphabet
static FALSE_POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "Bitcoin",
        "bitcoin",
        "Ethereum",
        "ethereum",
        "Solana",
        "solana",
        "Polygon",
        "polygon",
        "Avalanche",
        "avalanche",
        "Cardano",
        "cardano",
        "Polkadot",
        "polkadot",
        "Chainlink",
        "chainlink",
        "Uniswap",
        "uniswap",
        "Airdrop",
        "airdrop",
        "Binance",
        "binance",
        "Coinbase",
        "coinbase",
        "Bullish",
        "bullish",
        "Bearish",
        "bearish",
        "Moonshot",
        "moonshot",
        "Diamond",
        "diamond",
        "Phantom",
        "phantom",
        "Jupiter",
        "jupiter",
        "Raydium",
        "raydium",
        "Meteora",
        "meteora",
        "Telegram",
        "telegram",
        "Channel",
        "channel",
        "Private",
        "private",
        "Welcome",
        "welcome",
        "Trading",
        "trading",
        "Profits",
        "profits",
        "Million",
        "million",
        "Billion",
        "billion",
        "Congratulations",
        "congratulations",
    ])
});

// Well-known program ids and sysvars that are never tradeable tokens
static SYSTEM_ADDRESSES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "11111111111111111111111111111111",
        "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
        "So11111111111111111111111111111111111111112",
        "SysvarC1ock11111111111111111111111111111111",
        "SysvarRent111111111111111111111111111111111",
        "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL",
        "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s",
    ])
});

/// Detects Solana contract addresses (Base58, 32-44 chars).
///
/// Addresses are case-sensitive; no normalization is applied. Candidates
/// that are known English words, known system addresses, or all one case
/// are rejected.
pub struct SolanaDetector;

impl SolanaDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SolanaDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainDetector for SolanaDetector {
    fn chain_name(&self) -> &'static str {
        CHAIN_NAME
    }

    fn detect(&self, text: &str, chat_id: i64, message_id: i64) -> Vec<TokenMatch> {
        let now = Utc::now();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut matches = Vec::new();

        for m in BASE58_RUN.find_iter(text) {
            let candidate = m.as_str();

            if seen.contains(candidate) {
                continue;
            }
            if FALSE_POSITIVE_WORDS.contains(candidate) {
                continue;
            }
            if SYSTEM_ADDRESSES.contains(candidate) {
                continue;
            }

            // Single-case runs are almost always English words
            let has_upper = candidate.chars().any(|c| c.is_ascii_uppercase());
            let has_lower = candidate.chars().any(|c| c.is_ascii_lowercase());
            if !(has_upper && has_lower) {
                continue;
            }

            seen.insert(candidate);
            matches.push(TokenMatch {
                contract: candidate.to_string(),
                chain: CHAIN_NAME.to_string(),
                chat_id,
                message_id,
                observed_at: now,
            });
        }

        if !matches.is_empty() {
            tracing::debug!(
                count = matches.len(),
                chat_id,
                message_id,
                "Solana detector found contracts"
            );
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn detect(text: &str) -> Vec<TokenMatch> {
        SolanaDetector::new().detect(text, 1, 1)
    }

    #[test]
    fn test_detects_valid_address() {
        let matches = detect(&format!("Check out this token: {BONK}"));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].contract, BONK);
        assert_eq!(matches[0].chain, "solana");
    }

    #[test]
    fn test_ignores_common_words() {
        let matches = detect("Bitcoin and Ethereum are going up today! Solana is great.");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_ignores_false_positive_sentence() {
        let matches = detect("Congratulations on the Launch");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_ignores_system_addresses() {
        let matches = detect("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_rejects_single_case_runs() {
        // 33 chars each, valid Base58 alphabet but one case only
        let matches = detect("abcdefghijkmnopqrstuvwxyzabcdefgh ABCDEFGHJKMNPQRSTUVWXYZABCDEFGH");
        assert!(matches.is_empty());
    }

    #[test]
    fn test_deduplicates_within_message() {
        let matches = detect(&format!("Buy {BONK} now! I said {BONK}!"));
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_multiple_addresses() {
        let matches = detect(&format!(
            "{BONK} 7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr"
        ));
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_length_bounds() {
        // 31 chars: below the minimum mint length
        let short = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xj";
        assert_eq!(short.len(), 31);
        assert!(detect(short).is_empty());

        // 45-char run: too long to be an address, and no shorter window
        // inside it is delimited by word boundaries on both sides
        let long = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263x";
        assert_eq!(long.len(), 45);
        assert!(detect(long).is_empty());

        for m in detect("some text DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263") {
            assert!(m.contract.len() >= 32 && m.contract.len() <= 44);
        }
    }
}
