//! # Emberlend Common
//!
//! Shared types, errors, and policy constants for the Emberlend
//! micro-loan underwriting system.
//!
//! ## Core Types
//!
//! - [`Address`]: borrower identity key (hex wallet address)
//! - [`UnderwritingContext`]: typed record threaded through the scoring pipeline
//! - [`CreditProfile`]: the tuple persisted by the ledger's credit-score store
//! - [`LoanRecord`]: active-loan state owned by the ledger collaborator
//! - [`FinancialSnapshot`]: transient traditional-finance attributes
//!
//! ## Policy
//!
//! - [`policy`]: risk bands, APR bounds, and the single acceptable-risk ceiling

pub mod error;
pub mod policy;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{DenialReason, EmberlendError, Result};
pub use types::{
    address::Address,
    context::UnderwritingContext,
    profile::{CreditProfile, LoanRecord},
    snapshot::{BankingAttributes, BureauAttributes, FinancialSnapshot, PaymentHistory},
};

/// Emberlend version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
