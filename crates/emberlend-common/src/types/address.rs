//! Borrower address - the identity key for every ledger record

use serde::{Deserialize, Serialize};

/// Hex wallet address identifying a borrower.
///
/// Stored lowercased so map lookups against the ledger are
/// case-insensitive, matching checksummed-address normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Deterministic seed in 0..1000 derived from the address tail.
    ///
    /// Used to synthesize stable financial snapshots when the attested
    /// external source is unavailable: the same address always produces
    /// the same snapshot. Not a security property.
    pub fn seed(&self) -> u64 {
        let tail: String = self
            .0
            .chars()
            .filter(|c| c.is_ascii_hexdigit())
            .collect::<Vec<_>>()
            .iter()
            .rev()
            .take(8)
            .rev()
            .collect();

        match u64::from_str_radix(&tail, 16) {
            Ok(v) => v % 1000,
            // Non-hex address: fall back to a byte sum, still stable
            Err(_) => self.0.bytes().map(u64::from).sum::<u64>() % 1000,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_stable() {
        let a = Address::new("0xAbC123456789deF0AbC123456789deF012345678");
        assert_eq!(a.seed(), a.seed());
        assert!(a.seed() < 1000);
    }

    #[test]
    fn test_case_insensitive_identity() {
        let a = Address::new("0xABCDEF0000000000000000000000000000000001");
        let b = Address::new("0xabcdef0000000000000000000000000000000001");
        assert_eq!(a, b);
        assert_eq!(a.seed(), b.seed());
    }

    #[test]
    fn test_seed_matches_hex_tail() {
        // last 8 hex digits of the address, mod 1000
        let a = Address::new("0x000000000000000000000000000000001234abcd");
        assert_eq!(a.seed(), 0x1234abcd_u64 % 1000);
    }

    #[test]
    fn test_non_hex_address_still_seeds() {
        let a = Address::new("not-a-hex-address-zzz");
        assert!(a.seed() < 1000);
    }
}
