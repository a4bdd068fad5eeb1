//! Error types for the Emberlend underwriting core
//!
//! Provides a unified error type plus the structured denial reasons the
//! loan decision gateway surfaces to callers.

use thiserror::Error;

/// Result type alias using EmberlendError
pub type Result<T> = std::result::Result<T, EmberlendError>;

/// Unified error type for Emberlend operations
#[derive(Debug, Error)]
pub enum EmberlendError {
    /// An external data source (snapshot fetch, price feed, randomness) is
    /// down. Components recover from this locally; it only escapes when a
    /// required ledger read fails.
    #[error("External data unavailable: {0}")]
    DataUnavailable(String),

    /// The intelligent scoring service failed or returned malformed output.
    /// Always recovered locally via the rule-based formulas.
    #[error("Scoring service error: {0}")]
    ScoringService(String),

    /// No credit profile on file for the address (sentinel risk score).
    #[error("No credit profile on file for {0}. Run scoring first.")]
    NoProfile(String),

    /// A loan precondition check failed. Never retried automatically.
    #[error("Loan denied: {0}")]
    PolicyDenial(#[from] DenialReason),

    /// The credit-profile write was rejected or not confirmed.
    #[error("Credit profile submission failed: {0}")]
    LedgerWriteFailed(String),

    /// The ledger contract reverted a disbursement transaction.
    #[error("Ledger rejected the transaction: {0}")]
    LedgerRevert(String),

    /// An unrecovered error aborted the underwriting pipeline.
    #[error("Underwriting pipeline failed: {0}")]
    PipelineFailed(String),

    /// An outbound call exceeded its bounded timeout.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Configuration error at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The specific precondition that denied a loan decision.
///
/// Both gateway paths evaluate the same checklist in a fixed order, each
/// check short-circuiting, so a denial always names exactly one reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DenialReason {
    #[error("Requested amount must be greater than 0")]
    AmountNotPositive,

    #[error("An active loan already exists. Repay it before borrowing again")]
    ActiveLoan,

    #[error("Credit risk score {risk}/100 exceeds the maximum acceptable threshold of {ceiling}")]
    RiskTooHigh { risk: u8, ceiling: u8 },

    #[error("Requested {requested} exceeds the max borrowing limit of {max_borrow}")]
    ExceedsBorrowLimit { requested: u128, max_borrow: u128 },

    #[error("Insufficient pool liquidity: {available} available, {requested} requested")]
    InsufficientLiquidity { available: u128, requested: u128 },
}

impl From<serde_json::Error> for EmberlendError {
    fn from(err: serde_json::Error) -> Self {
        EmberlendError::ScoringService(format!("malformed JSON: {err}"))
    }
}

impl From<std::io::Error> for EmberlendError {
    fn from(err: std::io::Error) -> Self {
        EmberlendError::Internal(err.to_string())
    }
}
