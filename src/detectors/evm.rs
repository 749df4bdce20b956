//! EVM contract address detector (Ethereum, BSC, Base, Arbitrum, etc.)

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::ChainDetector;
use crate::models::TokenMatch;

const CHAIN_NAME: &str = "evm";

// Standard EVM address: 0x followed by exactly 40 hex characters
static EVM_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b0x[0-9a-fA-F]{40}\b").expect("valid evm pattern"));

// Zero, dead-max and conventional burn addresses (lowercase)
static BURN_ADDRESSES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "0x0000000000000000000000000000000000000000",
        "0xffffffffffffffffffffffffffffffffffffffff",
        "0x000000000000000000000000000000000000dead",
        "0xdead000000000000000000000000000000000000",
    ])
});

/// Detects EVM-compatible contract addresses (0x + 40 hex).
///
/// Addresses are case-insensitive and lowercased before in-message dedup;
/// EIP-55 checksumming is not preserved.
pub struct EvmDetector;

impl EvmDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EvmDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainDetector for EvmDetector {
    fn chain_name(&self) -> &'static str {
        CHAIN_NAME
    }

    fn detect(&self, text: &str, chat_id: i64, message_id: i64) -> Vec<TokenMatch> {
        let now = Utc::now();
        let mut seen: HashSet<String> = HashSet::new();
        let mut matches = Vec::new();

        for m in EVM_ADDRESS.find_iter(text) {
            let normalized = m.as_str().to_ascii_lowercase();

            if seen.contains(&normalized) {
                continue;
            }
            if BURN_ADDRESSES.contains(normalized.as_str()) {
                continue;
            }

            seen.insert(normalized.clone());
            matches.push(TokenMatch {
                contract: normalized,
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
                "EVM detector found contracts"
            );
        }

        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEPE: &str = "0x6982508145454ce325ddbe47a25d4ec3d2311933";

    fn detect(text: &str) -> Vec<TokenMatch> {
        EvmDetector::new().detect(text, 1, 1)
    }

    #[test]
    fn test_detects_and_normalizes() {
        let matches = detect("ape into 0x6982508145454CE325DDBE47A25D4EC3D2311933 now");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].contract, PEPE);
        assert_eq!(matches[0].chain, "evm");
    }

    #[test]
    fn test_output_shape_after_normalization() {
        let re = Regex::new(r"^0x[0-9a-f]{40}$").unwrap();
        let matches = detect(&format!(
            "{PEPE} and 0xABCDEFabcdef0123456789012345678901234567 🚀"
        ));
        assert_eq!(matches.len(), 2);
        for m in matches {
            assert_eq!(m.contract.len(), 42);
            assert!(re.is_match(&m.contract));
        }
    }

    #[test]
    fn test_case_variants_collapse_to_one_match() {
        let upper = PEPE.to_ascii_uppercase().replace("0X", "0x");
        let matches = detect(&format!("{PEPE} again {upper}"));
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_rejects_burn_addresses() {
        let matches = detect(
            "0x0000000000000000000000000000000000000000 \
             0xffffffffffffffffffffffffffffffffffffffff \
             0x000000000000000000000000000000000000dEaD",
        );
        assert!(matches.is_empty());
    }

    #[test]
    fn test_rejects_wrong_length() {
        // 39 and 41 hex digits
        assert!(detect("0x6982508145454ce325ddbe47a25d4ec3d231193").is_empty());
        assert!(detect("0x6982508145454ce325ddbe47a25d4ec3d23119331").is_empty());
    }

    #[test]
    fn test_multiple_distinct_addresses() {
        let matches = detect(&format!(
            "{PEPE} vs 0x95ad61b0a150d79219dcf64e1e6cc01f0b64c4ce"
        ));
        assert_eq!(matches.len(), 2);
    }
}
