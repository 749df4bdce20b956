//! Per-contract alert cooldown gate

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Suppresses repeat alerts for a contract until its cooldown expires.
///
/// Process-local and owned by the trending task alone, so no locking is
/// needed. State is lost on restart; the worst case is one duplicate alert
/// per contract per restart.
pub struct CooldownGate {
    cooldown: Duration,
    entries: HashMap<String, DateTime<Utc>>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            entries: HashMap::new(),
        }
    }

    /// Returns true iff no unexpired entry exists for `contract`, and
    /// stamps a new expiry on admission.
    pub fn admit(&mut self, contract: &str) -> bool {
        self.admit_at(contract, Utc::now())
    }

    fn admit_at(&mut self, contract: &str, now: DateTime<Utc>) -> bool {
        match self.entries.get(contract) {
            Some(expires_at) if *expires_at > now => false,
            _ => {
                self.entries
                    .insert(contract.to_string(), now + self.cooldown);
                true
            }
        }
    }

    /// Drop all entries whose expiry has passed.
    pub fn prune(&mut self) {
        self.prune_at(Utc::now());
    }

    fn prune_at(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires_at| *expires_at > now);
    }

    /// Number of live entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_admission_passes() {
        let mut gate = CooldownGate::new(Duration::minutes(15));
        assert!(gate.admit("X"));
        assert_eq!(gate.len(), 1);
    }

    #[test]
    fn test_repeat_alerts_suppressed_within_cooldown() {
        let mut gate = CooldownGate::new(Duration::minutes(15));
        let t0 = Utc::now();

        assert!(gate.admit_at("X", t0));
        assert!(!gate.admit_at("X", t0 + Duration::minutes(1)));
        assert!(!gate.admit_at("X", t0 + Duration::minutes(5)));
        assert!(!gate.admit_at("X", t0 + Duration::minutes(14)));
        assert!(gate.admit_at("X", t0 + Duration::minutes(15) + Duration::seconds(1)));
    }

    #[test]
    fn test_contracts_are_independent() {
        let mut gate = CooldownGate::new(Duration::minutes(15));
        let t0 = Utc::now();

        assert!(gate.admit_at("X", t0));
        assert!(gate.admit_at("Y", t0));
        assert!(!gate.admit_at("X", t0 + Duration::minutes(1)));
    }

    #[test]
    fn test_prune_removes_only_expired_entries() {
        let mut gate = CooldownGate::new(Duration::minutes(15));
        let t0 = Utc::now();

        gate.admit_at("old", t0);
        gate.admit_at("fresh", t0 + Duration::minutes(10));
        gate.prune_at(t0 + Duration::minutes(16));

        assert_eq!(gate.len(), 1);
        assert!(!gate.admit_at("fresh", t0 + Duration::minutes(16)));
    }

    #[test]
    fn test_admission_after_expiry_restamps() {
        let mut gate = CooldownGate::new(Duration::minutes(15));
        let t0 = Utc::now();

        assert!(gate.admit_at("X", t0));
        assert!(gate.admit_at("X", t0 + Duration::minutes(16)));
        // Restamped at the second admission, so suppressed again
        assert!(!gate.admit_at("X", t0 + Duration::minutes(30)));
    }
}
