//! Submission agent
//!
//! Writes the finalized score tuple to the ledger's credit-score store.
//! Resubmission overwrites the prior record. A rejected or unconfirmed
//! write is fatal for the pipeline run: without a stored profile,
//! underwriting cannot proceed, so the failure is surfaced rather than
//! recovered. The write is never retried here - on-chain transactions
//! are not safe to blindly resubmit.

use std::sync::Arc;

use tracing::{error, info};

use emberlend_common::{EmberlendError, Result, UnderwritingContext};

use crate::clients::{LedgerClient, TxReceipt};
use crate::deadline::{bounded, Timeouts};

pub struct SubmissionAgent {
    ledger: Arc<dyn LedgerClient>,
    timeouts: Timeouts,
}

impl SubmissionAgent {
    pub fn new(ledger: Arc<dyn LedgerClient>, timeouts: Timeouts) -> Self {
        Self { ledger, timeouts }
    }

    /// Write the context's profile to the ledger and return the
    /// confirmation receipt.
    pub async fn submit(&self, ctx: &UnderwritingContext) -> Result<TxReceipt> {
        let profile = ctx.to_profile();

        let receipt = bounded(
            self.timeouts.ledger,
            "credit profile write",
            self.ledger.write_credit_profile(&ctx.user_address, &profile),
        )
        .await
        .map_err(|err| {
            error!(address = %ctx.user_address, %err, "credit profile submission failed");
            EmberlendError::LedgerWriteFailed(err.to_string())
        })?;

        info!(
            address = %ctx.user_address,
            tx_hash = %receipt.tx_hash,
            "credit profile submitted"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryLedger;
    use emberlend_common::policy::TOKEN;
    use emberlend_common::Address;

    fn finished_context(address: &Address) -> UnderwritingContext {
        let mut ctx = UnderwritingContext::new(address.clone(), 0);
        ctx.tradfi_score = 900;
        ctx.onchain_score = 80;
        ctx.combined_risk_score = 14;
        ctx.max_borrow_amount = 50_000 * TOKEN;
        ctx.apr_bps = 342;
        ctx.valid_until = 99_999;
        ctx
    }

    #[tokio::test]
    async fn test_submit_stores_profile() {
        let address = Address::new("0x01");
        let ledger = Arc::new(InMemoryLedger::new(0));
        let agent = SubmissionAgent::new(ledger.clone(), Timeouts::default());

        let receipt = agent.submit(&finished_context(&address)).await.unwrap();
        assert!(!receipt.tx_hash.is_empty());

        let stored = ledger.get_credit_profile(&address).await.unwrap();
        assert_eq!(stored.combined_risk_score, 14);
        assert!(!stored.is_sentinel());
    }

    #[tokio::test]
    async fn test_resubmission_overwrites() {
        let address = Address::new("0x02");
        let ledger = Arc::new(InMemoryLedger::new(0));
        let agent = SubmissionAgent::new(ledger.clone(), Timeouts::default());

        agent.submit(&finished_context(&address)).await.unwrap();

        let mut second = finished_context(&address);
        second.combined_risk_score = 33;
        second.apr_bps = 410;
        agent.submit(&second).await.unwrap();

        // Overwrite, not merge: the store holds exactly the second tuple
        let stored = ledger.get_credit_profile(&address).await.unwrap();
        assert_eq!(stored.combined_risk_score, 33);
        assert_eq!(stored.apr_bps, 410);
    }

    #[tokio::test]
    async fn test_rejected_write_surfaces_failure() {
        let address = Address::new("0x03");
        let ledger = Arc::new(InMemoryLedger::new(0));
        ledger.reject_writes();
        let agent = SubmissionAgent::new(ledger, Timeouts::default());

        let err = agent.submit(&finished_context(&address)).await.unwrap_err();
        assert!(matches!(err, EmberlendError::LedgerWriteFailed(_)));
    }
}
