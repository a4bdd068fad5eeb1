//! Underwriting context - the typed record threaded through the pipeline
//!
//! Each pipeline stage fills in its own fields; by submission time the
//! context holds the complete underwriting result. Replaces the loose
//! key/value state-passing of earlier designs with named, typed fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::policy::TOKEN;
use crate::types::address::Address;
use crate::types::profile::CreditProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderwritingContext {
    /// Borrower identity key
    pub user_address: Address,
    /// Requested loan amount in smallest units; 0 means "no specific amount"
    pub requested_amount: u128,

    // Populated by the TradFi collector
    /// Traditional-finance score, 0-1000
    pub tradfi_score: u16,

    // Populated by the OnChain collector
    /// On-chain reputation score, 0-100
    pub onchain_score: u8,
    /// Wallet balance in smallest units
    pub balance: u128,
    pub transaction_count: u64,
    /// Estimated wallet age, capped at two years
    pub wallet_age_days: u32,
    pub is_active_user: bool,
    /// Native-asset USD price, when the price feed answered
    pub native_price_usd: Option<Decimal>,
    /// Loan-asset USD price, when the price feed answered
    pub loan_price_usd: Option<Decimal>,

    // Populated by the risk aggregator
    /// Combined risk score, 0-100 (lower = better)
    pub combined_risk_score: u8,
    /// Max borrow ceiling in smallest units
    pub max_borrow_amount: u128,
    /// APR in basis points, clamped to [300, 600] after jitter
    pub apr_bps: u16,
    /// Verifiable-randomness APR jitter, absent when the source was down
    pub rng_jitter_bps: Option<i16>,
    /// min(requested, max_borrow), or max_borrow when nothing was requested
    pub approved_amount: u128,
    /// Approved loan value in USD, when a loan-asset price is known
    pub loan_value_usd: Option<Decimal>,
    /// Borrow ceiling in USD, when a loan-asset price is known
    pub max_borrow_usd: Option<Decimal>,
    /// Unix expiry timestamp: submission time + 30 days
    pub valid_until: i64,

    // Populated by the submission agent
    /// Ledger write confirmation (transaction identifier)
    pub submission_handle: Option<String>,
}

impl UnderwritingContext {
    pub fn new(user_address: Address, requested_amount: u128) -> Self {
        Self {
            user_address,
            requested_amount,
            tradfi_score: 0,
            onchain_score: 0,
            balance: 0,
            transaction_count: 0,
            wallet_age_days: 0,
            is_active_user: false,
            native_price_usd: None,
            loan_price_usd: None,
            combined_risk_score: 0,
            max_borrow_amount: 0,
            apr_bps: 0,
            rng_jitter_bps: None,
            approved_amount: 0,
            loan_value_usd: None,
            max_borrow_usd: None,
            valid_until: 0,
            submission_handle: None,
        }
    }

    /// Utilization of the borrow ceiling by the requested amount, in 0..=1.
    pub fn utilization(&self) -> f64 {
        utilization(self.requested_amount, self.max_borrow_amount)
    }

    /// The tuple the submission agent writes to the ledger.
    pub fn to_profile(&self) -> CreditProfile {
        CreditProfile {
            tradfi_score: self.tradfi_score,
            onchain_score: self.onchain_score,
            combined_risk_score: self.combined_risk_score,
            max_borrow_amount: self.max_borrow_amount,
            apr_bps: self.apr_bps,
            valid_until: self.valid_until,
        }
    }
}

/// Utilization ratio of `requested` against `max_borrow`, clamped to 1.0.
pub fn utilization(requested: u128, max_borrow: u128) -> f64 {
    if max_borrow == 0 || requested == 0 {
        return 0.0;
    }
    (requested as f64 / max_borrow as f64).min(1.0)
}

/// Convert a smallest-unit amount to whole tokens (lossy, for display
/// and USD valuation).
pub fn to_tokens(amount: u128) -> f64 {
    amount as f64 / TOKEN as f64
}

/// USD value of a smallest-unit amount at the given per-token price.
pub fn usd_value(amount: u128, price: Decimal) -> Option<Decimal> {
    let tokens = Decimal::from_f64_retain(to_tokens(amount))?;
    let value = tokens.checked_mul(price)?;
    Some(value.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_utilization_clamped() {
        assert_eq!(utilization(0, 100), 0.0);
        assert_eq!(utilization(50, 100), 0.5);
        assert_eq!(utilization(200, 100), 1.0);
        assert_eq!(utilization(10, 0), 0.0);
    }

    #[test]
    fn test_usd_value() {
        let v = usd_value(500 * TOKEN, dec!(2.50)).unwrap();
        assert_eq!(v, dec!(1250.00));
    }

    #[test]
    fn test_to_profile_carries_scores() {
        let mut ctx = UnderwritingContext::new(Address::new("0xabc"), 0);
        ctx.tradfi_score = 900;
        ctx.onchain_score = 80;
        ctx.combined_risk_score = 14;
        ctx.max_borrow_amount = 50_000 * TOKEN;
        ctx.apr_bps = 342;
        ctx.valid_until = 1234;

        let profile = ctx.to_profile();
        assert_eq!(profile.tradfi_score, 900);
        assert_eq!(profile.combined_risk_score, 14);
        assert_eq!(profile.valid_until, 1234);
        assert!(!profile.is_sentinel());
    }
}
