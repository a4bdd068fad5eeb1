//! Underwriting orchestrator
//!
//! Runs the pipeline `START -> {TradFi, OnChain} -> MERGE -> RISK ->
//! SUBMIT -> DONE`. The collectors touch disjoint systems and run
//! concurrently; the merge is a join barrier, so risk aggregation never
//! starts before both signals are in. Submission only runs after
//! aggregation completes - no partial submission can occur.

use tracing::{info, instrument};

use emberlend_common::{Address, EmberlendError, Result, UnderwritingContext};

use crate::collect::{OnChainCollector, TradFiCollector};
use crate::risk::RiskAggregator;
use crate::submission::SubmissionAgent;

pub struct Underwriter {
    tradfi: TradFiCollector,
    onchain: OnChainCollector,
    risk: RiskAggregator,
    submission: SubmissionAgent,
}

impl Underwriter {
    pub fn new(
        tradfi: TradFiCollector,
        onchain: OnChainCollector,
        risk: RiskAggregator,
        submission: SubmissionAgent,
    ) -> Self {
        Self {
            tradfi,
            onchain,
            risk,
            submission,
        }
    }

    /// Run the full pipeline for an address and return the completed
    /// context, including the submission handle.
    ///
    /// `requested_amount` of 0 means "no specific amount": terms are
    /// derived for the full borrow ceiling.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn run(
        &self,
        address: &Address,
        requested_amount: u128,
    ) -> Result<UnderwritingContext> {
        let mut ctx = UnderwritingContext::new(address.clone(), requested_amount);

        // Fan-out: the collectors are independent
        let (tradfi, onchain) = tokio::join!(
            self.tradfi.collect(address),
            self.onchain.collect(address)
        );

        // Merge: an unrecovered branch error is fatal here
        let onchain = onchain.map_err(|err| {
            EmberlendError::PipelineFailed(format!("onchain collector: {err}"))
        })?;

        ctx.tradfi_score = tradfi.tradfi_score;
        ctx.onchain_score = onchain.onchain_score;
        ctx.balance = onchain.balance;
        ctx.transaction_count = onchain.transaction_count;
        ctx.wallet_age_days = onchain.wallet_age_days;
        ctx.is_active_user = onchain.is_active_user;
        ctx.native_price_usd = onchain.native_price_usd;
        ctx.loan_price_usd = onchain.loan_price_usd;

        self.risk.assess(&mut ctx).await;

        let receipt = self.submission.submit(&ctx).await?;
        ctx.submission_handle = Some(receipt.tx_hash);

        info!(
            tradfi = ctx.tradfi_score,
            onchain = ctx.onchain_score,
            risk = ctx.combined_risk_score,
            apr_bps = ctx.apr_bps,
            "underwriting pipeline complete"
        );
        Ok(ctx)
    }
}
