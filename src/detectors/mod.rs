//! Pluggable contract detectors
//!
//! Each supported chain provides one [`ChainDetector`]. Extraction is pure
//! and deterministic: no I/O, no state, and a malformed candidate is simply
//! not emitted. Adding a chain means implementing the trait with a fresh
//! `chain_name` and registering the detector; nothing downstream changes.

mod evm;
mod solana;

pub use evm::EvmDetector;
pub use solana::SolanaDetector;

use crate::models::TokenMatch;

/// Capability set every chain detector implements.
pub trait ChainDetector: Send + Sync {
    /// Canonical chain identifier (lowercase, e.g. "solana", "evm")
    fn chain_name(&self) -> &'static str;

    /// Extract all contract identifiers from one message body.
    ///
    /// Duplicate contracts within the same message are collapsed to a
    /// single match.
    fn detect(&self, text: &str, chat_id: i64, message_id: i64) -> Vec<TokenMatch>;
}

/// Ordered collection of detectors the ingress path fans each message
/// through.
///
/// Results are concatenated in registration order. No cross-detector dedup
/// is performed; detector patterns are disjoint, so two chains never emit
/// the same normalized contract string.
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn ChainDetector>>,
}

impl DetectorRegistry {
    pub fn new(detectors: Vec<Box<dyn ChainDetector>>) -> Self {
        Self { detectors }
    }

    /// Registry with all built-in detectors.
    pub fn with_builtin_detectors() -> Self {
        Self::new(vec![
            Box::new(SolanaDetector::new()),
            Box::new(EvmDetector::new()),
        ])
    }

    /// Run every detector over one message and concatenate the results.
    pub fn detect_all(&self, text: &str, chat_id: i64, message_id: i64) -> Vec<TokenMatch> {
        self.detectors
            .iter()
            .flat_map(|d| d.detect(text, chat_id, message_id))
            .collect()
    }

    /// Chain names in registration order.
    pub fn chain_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.chain_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_fans_through_all_detectors() {
        let registry = DetectorRegistry::with_builtin_detectors();
        let text = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263 and \
                    0xABCDEFabcdef0123456789012345678901234567 pumping";
        let matches = registry.detect_all(text, 7, 42);

        assert_eq!(matches.len(), 2);
        // Registration order is preserved: solana first, then evm.
        assert_eq!(matches[0].chain, "solana");
        assert_eq!(matches[1].chain, "evm");
        assert_eq!(matches[1].contract, "0xabcdefabcdef0123456789012345678901234567");
    }

    #[test]
    fn test_registry_chain_names() {
        let registry = DetectorRegistry::with_builtin_detectors();
        assert_eq!(registry.chain_names(), vec!["solana", "evm"]);
        assert_eq!(registry.len(), 2);
    }
}
