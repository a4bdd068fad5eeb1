//! In-memory ledger implementation
//!
//! Mirrors the external lending contract's behavior: an address-keyed
//! credit-score store with sentinel semantics, loan records, a shared
//! liquidity pool, and a `disburse` that re-enforces every lending
//! precondition with the contract's own revert reasons. All operations
//! are atomic under a single lock, matching the contract's transaction
//! semantics.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use emberlend_common::{policy, Address, CreditProfile, EmberlendError, LoanRecord, Result};

use crate::clients::{LedgerClient, TxReceipt};

/// Revert reasons as the lending contract emits them.
pub mod revert_reasons {
    pub const NO_SCORE: &str = "No credit score on file";
    pub const RISK_TOO_HIGH: &str = "Credit risk too high";
    pub const EXCEEDS_LIMIT: &str = "Exceeds max borrow limit";
    pub const ACTIVE_LOAN: &str = "Already has active loan";
    pub const POOL_INSUFFICIENT: &str = "Lending pool insufficient";
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, u128>,
    tx_counts: HashMap<Address, u64>,
    profiles: HashMap<Address, CreditProfile>,
    loans: HashMap<Address, LoanRecord>,
    pool_balance: u128,
    reject_writes: bool,
}

/// Ledger backend holding all state in process memory.
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(pool_balance: u128) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                pool_balance,
                ..LedgerState::default()
            }),
        }
    }

    /// Seed a wallet's native balance and transaction count.
    pub fn set_wallet(&self, address: &Address, balance: u128, tx_count: u64) {
        let mut state = self.state.write();
        state.balances.insert(address.clone(), balance);
        state.tx_counts.insert(address.clone(), tx_count);
    }

    pub fn set_pool_balance(&self, balance: u128) {
        self.state.write().pool_balance = balance;
    }

    /// Make subsequent profile writes fail, for submission-failure tests.
    pub fn reject_writes(&self) {
        self.state.write().reject_writes = true;
    }

    /// Mark a loan repaid, releasing the borrower for a new one.
    pub fn settle_loan(&self, address: &Address) {
        if let Some(loan) = self.state.write().loans.get_mut(address) {
            loan.active = false;
        }
    }

    fn receipt() -> TxReceipt {
        TxReceipt {
            tx_hash: format!("0x{}", Uuid::new_v4().simple()),
            gas_used: Some(120_000),
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_balance(&self, address: &Address) -> Result<u128> {
        Ok(*self.state.read().balances.get(address).unwrap_or(&0))
    }

    async fn get_transaction_count(&self, address: &Address) -> Result<u64> {
        Ok(*self.state.read().tx_counts.get(address).unwrap_or(&0))
    }

    async fn get_credit_profile(&self, address: &Address) -> Result<CreditProfile> {
        // The store has no null representation: absence reads back as
        // the sentinel tuple
        Ok(self
            .state
            .read()
            .profiles
            .get(address)
            .copied()
            .unwrap_or_else(CreditProfile::sentinel))
    }

    async fn write_credit_profile(
        &self,
        address: &Address,
        profile: &CreditProfile,
    ) -> Result<TxReceipt> {
        let mut state = self.state.write();
        if state.reject_writes {
            return Err(EmberlendError::LedgerWriteFailed(
                "transaction not confirmed".into(),
            ));
        }
        state.profiles.insert(address.clone(), *profile);
        Ok(Self::receipt())
    }

    async fn get_loan(&self, address: &Address) -> Result<Option<LoanRecord>> {
        Ok(self.state.read().loans.get(address).copied())
    }

    async fn get_pool_balance(&self) -> Result<u128> {
        Ok(self.state.read().pool_balance)
    }

    async fn disburse(&self, address: &Address, amount: u128) -> Result<TxReceipt> {
        let mut state = self.state.write();

        let profile = state
            .profiles
            .get(address)
            .copied()
            .unwrap_or_else(CreditProfile::sentinel);
        if profile.is_sentinel() {
            return Err(EmberlendError::LedgerRevert(revert_reasons::NO_SCORE.into()));
        }
        if profile.combined_risk_score > policy::MAX_ACCEPTABLE_RISK {
            return Err(EmberlendError::LedgerRevert(revert_reasons::RISK_TOO_HIGH.into()));
        }
        if amount > profile.max_borrow_amount {
            return Err(EmberlendError::LedgerRevert(revert_reasons::EXCEEDS_LIMIT.into()));
        }
        if state.loans.get(address).is_some_and(|loan| loan.active) {
            return Err(EmberlendError::LedgerRevert(revert_reasons::ACTIVE_LOAN.into()));
        }
        if state.pool_balance < amount {
            return Err(EmberlendError::LedgerRevert(
                revert_reasons::POOL_INSUFFICIENT.into(),
            ));
        }

        state.pool_balance -= amount;
        state.loans.insert(
            address.clone(),
            LoanRecord {
                principal: amount,
                apr_bps: profile.apr_bps,
                started_at: Utc::now().timestamp(),
                active: true,
            },
        );
        Ok(Self::receipt())
    }
}
