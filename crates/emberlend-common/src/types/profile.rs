//! Credit profile and loan record as stored by the ledger collaborator
//!
//! Both are owned by the external ledger; this core reads them and, for
//! the profile, overwrites it through the submission agent.

use serde::{Deserialize, Serialize};

/// The credit-score tuple keyed by address in the ledger's score store.
///
/// The store has no null representation, so "no profile" is the sentinel
/// `combined_risk_score == 0`, never absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditProfile {
    /// Traditional-finance score, 0-1000 (higher = more creditworthy)
    pub tradfi_score: u16,
    /// On-chain reputation score, 0-100
    pub onchain_score: u8,
    /// Combined risk score, 0-100 (lower = better); 0 is the sentinel
    pub combined_risk_score: u8,
    /// Max borrow ceiling in smallest on-chain units
    pub max_borrow_amount: u128,
    /// APR in basis points
    pub apr_bps: u16,
    /// Unix timestamp after which the profile is stale
    pub valid_until: i64,
}

impl CreditProfile {
    /// Sentinel profile meaning "no real profile exists".
    pub fn sentinel() -> Self {
        Self {
            tradfi_score: 0,
            onchain_score: 0,
            combined_risk_score: 0,
            max_borrow_amount: 0,
            apr_bps: 0,
            valid_until: 0,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.combined_risk_score == 0
    }
}

/// An active (or settled) loan as recorded by the ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    /// Principal in smallest on-chain units
    pub principal: u128,
    /// APR in basis points
    pub apr_bps: u16,
    /// Unix timestamp of disbursement
    pub started_at: i64,
    pub active: bool,
}

impl LoanRecord {
    /// Simple interest accrued from `started_at` to `now`:
    /// `principal * apr * elapsed / (10000 * seconds_per_year)`.
    pub fn accrued_interest(&self, now: i64) -> u128 {
        const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;
        let elapsed = now.saturating_sub(self.started_at).max(0) as u128;
        self.principal * self.apr_bps as u128 * elapsed / (10_000 * SECONDS_PER_YEAR)
    }

    /// Principal plus accrued simple interest.
    pub fn repayment_amount(&self, now: i64) -> u128 {
        self.principal + self.accrued_interest(now)
    }
}
