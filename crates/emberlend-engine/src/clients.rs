//! Collaborator contracts consumed by the underwriting core
//!
//! The ledger, attested data fetch, intelligent scoring, verifiable
//! randomness, and price-feed collaborators are all external systems.
//! The core only depends on these traits; wire formats live behind the
//! implementations. Every implementation must be safe for concurrent use.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emberlend_common::{Address, CreditProfile, FinancialSnapshot, LoanRecord, Result};

/// Confirmation handle for a submitted ledger transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction identifier
    pub tx_hash: String,
    /// Gas consumed, when the ledger reports it
    pub gas_used: Option<u64>,
}

/// One draw from the verifiable randomness source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomDraw {
    pub value: u128,
    /// Whether the round was produced by the secure protocol path
    pub is_secure: bool,
}

/// Identifier of a price feed, e.g. `"FLR/USD"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(pub String);

impl FeedId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// A USD price quote for one feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedPrice {
    pub price: Decimal,
}

/// Client for the authoritative on-chain ledger: balances, the
/// credit-score store, loan records, and the shared liquidity pool.
///
/// All state behind this trait is global and mutated only through the
/// ledger's own atomic operations; the core never caches it across
/// requests.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Native balance of an address in smallest units.
    async fn get_balance(&self, address: &Address) -> Result<u128>;

    /// Number of transactions the address has sent.
    async fn get_transaction_count(&self, address: &Address) -> Result<u64>;

    /// The stored credit profile; the sentinel (risk score 0) when none
    /// was ever submitted.
    async fn get_credit_profile(&self, address: &Address) -> Result<CreditProfile>;

    /// Overwrite the credit profile for an address. Resubmission
    /// replaces, never appends.
    async fn write_credit_profile(
        &self,
        address: &Address,
        profile: &CreditProfile,
    ) -> Result<TxReceipt>;

    /// The loan record for an address, `None` when no loan was ever taken.
    async fn get_loan(&self, address: &Address) -> Result<Option<LoanRecord>>;

    /// Current liquidity of the shared lending pool in smallest units.
    async fn get_pool_balance(&self) -> Result<u128>;

    /// Instruct the ledger to disburse a loan. The contract re-enforces
    /// every lending precondition on-chain; a rejection surfaces as
    /// [`emberlend_common::EmberlendError::LedgerRevert`] carrying the
    /// raw revert reason.
    async fn disburse(&self, address: &Address, amount: u128) -> Result<TxReceipt>;
}

/// Attested external-data fetch for traditional-finance attributes.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    /// Fetch the financial snapshot for an address; `DataUnavailable`
    /// when the attestation path is down.
    async fn fetch_snapshot(&self, address: &Address) -> Result<FinancialSnapshot>;
}

/// Optional intelligent scoring service (LLM-backed).
///
/// Used identically by all three scoring stages with different rubrics,
/// and by the evaluate path for a plain-text rationale.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Run one completion: a rubric as the system prompt, structured
    /// input as the user prompt. Scoring stages expect strict JSON back;
    /// the rationale path expects plain text.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Verifiable randomness source used for APR jitter.
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    async fn get_random(&self) -> Result<RandomDraw>;
}

/// External price oracle for USD valuation.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Prices for the given feeds, in feed order.
    async fn get_prices(&self, feeds: &[FeedId]) -> Result<Vec<FeedPrice>>;
}

#[cfg(test)]
mockall::mock! {
    pub Scoring {}

    #[async_trait]
    impl ScoringService for Scoring {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
    }
}
