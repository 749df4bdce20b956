//! Alert delivery
//!
//! The orchestrator formats each admitted trending token and hands the
//! text to an [`AlertSink`]. Delivery failure is a status, not an error;
//! it is logged with the full payload and never retried synchronously.

mod telegram;

pub use telegram::TelegramNotifier;

use async_trait::async_trait;

use crate::models::TrendingToken;

/// Outcome of one alert delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    Failed,
}

/// Sink that accepts a formatted alert string for delivery.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, text: &str) -> SendOutcome;
}

/// Format one trending token as a Markdown alert message.
pub fn format_alert(token: &TrendingToken, window_minutes: i64) -> String {
    let chain_display = token.chain.to_uppercase();
    let velocity_display = if token.velocity != 0.0 {
        format!("{:+.0}%", token.velocity * 100.0)
    } else {
        "NEW".to_string()
    };
    let links = build_links(&token.chain, &token.contract);

    format!(
        "🚨 *TRENDING TOKEN DETECTED*\n\
         \n\
         🔗 *Chain:* {chain_display}\n\
         📋 *Contract:* `{contract}`\n\
         💬 *Mentions ({window_minutes}m):* {mentions}\n\
         👥 *Unique Groups:* {unique_chats}\n\
         📈 *Velocity:* {velocity_display}\n\
         ⭐ *Score:* {score:.1}\n\
         \n\
         🔗 {links}\n",
        contract = token.contract,
        mentions = token.mentions,
        unique_chats = token.unique_chats,
        score = token.score,
    )
}

/// Chain-appropriate explorer and trading tool links.
fn build_links(chain: &str, contract: &str) -> String {
    match chain {
        "solana" => format!(
            "[DS](https://dexscreener.com/solana/{contract})\
             | [GMGN](https://gmgn.ai/sol/token/{contract})\
             | [PH](https://photon-sol.tinyastro.io/en/lp/{contract})\
             | [AXI](https://axiom.trade/t/{contract})"
        ),
        "evm" => format!(
            "[DS](https://dexscreener.com/ethereum/{contract})\
             | [GMGN](https://gmgn.ai/eth/token/{contract})\
             | [DT](https://www.dextools.io/app/en/ether/pair-explorer/{contract})\
             | [Etherscan](https://etherscan.io/token/{contract})"
        ),
        _ => format!(
            "[DS](https://dexscreener.com/{chain}/{contract})\
             | [GMGN](https://gmgn.ai/{chain}/token/{contract})"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_token() -> TrendingToken {
        TrendingToken {
            contract: "0xabcdefabcdef0123456789012345678901234567".to_string(),
            chain: "evm".to_string(),
            mentions: 3,
            unique_chats: 2,
            velocity: 3.0,
            score: 27.0,
        }
    }

    #[test]
    fn test_alert_carries_all_fields() {
        let text = format_alert(&sample_token(), 5);
        assert!(text.contains("EVM"));
        assert!(text.contains("`0xabcdefabcdef0123456789012345678901234567`"));
        assert!(text.contains("Mentions (5m):* 3"));
        assert!(text.contains("Unique Groups:* 2"));
        assert!(text.contains("+300%"));
        assert!(text.contains("27.0"));
        assert!(text.contains("etherscan.io"));
    }

    #[test]
    fn test_zero_velocity_renders_as_new() {
        let mut token = sample_token();
        token.velocity = 0.0;
        assert!(format_alert(&token, 5).contains("*Velocity:* NEW"));
    }

    #[test]
    fn test_solana_links() {
        let mut token = sample_token();
        token.chain = "solana".to_string();
        token.contract = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string();
        let text = format_alert(&token, 5);
        assert!(text.contains("dexscreener.com/solana/"));
        assert!(text.contains("gmgn.ai/sol/token/"));
    }

    #[test]
    fn test_unknown_chain_gets_generic_links() {
        let links = build_links("ton", "EQabc");
        assert!(links.contains("dexscreener.com/ton/EQabc"));
        assert!(links.contains("gmgn.ai/ton/token/EQabc"));
    }
}
