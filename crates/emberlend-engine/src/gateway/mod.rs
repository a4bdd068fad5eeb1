//! Loan decision gateway
//!
//! Two entry points over the same precondition checklist, evaluated in a
//! fixed order with each check short-circuiting:
//!
//! 1. requested amount > 0
//! 2. no existing active loan
//! 3. a non-sentinel credit profile exists
//! 4. risk within the policy ceiling
//! 5. requested amount within the borrow limit
//! 6. pool liquidity covers the request
//!
//! [`LoanGateway::evaluate`] is advisory: it quotes terms off the
//! last-submitted profile and current ledger reads, and its answer may be
//! stale by the time disbursement is attempted. [`LoanGateway::disburse`]
//! therefore re-runs every check from scratch against fresh ledger state
//! before moving funds; the contract itself re-enforces the same checks
//! on-chain, so the gateway's pass is a fast-fail, not a security
//! boundary.

pub mod revert;

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

use emberlend_common::types::context::{to_tokens, usd_value, utilization};
use emberlend_common::{
    policy, Address, CreditProfile, DenialReason, EmberlendError, LoanRecord, Result,
};

use crate::clients::{LedgerClient, PriceFeed, TxReceipt};
use crate::collect::onchain::PriceFeeds;
use crate::deadline::{bounded, Timeouts};
use crate::scoring::{rubrics, ScoreAdapter};

/// Outcome of an advisory loan evaluation.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub approved: bool,
    /// Approval rationale or the denial message
    pub reason: String,
    pub requested_amount: u128,
    pub max_borrow_amount: u128,
    pub utilization: Option<f64>,
    pub base_apr_bps: Option<u16>,
    pub adjusted_apr_bps: Option<u16>,
    pub utilization_premium_bps: Option<u16>,
    pub loan_value_usd: Option<Decimal>,
    /// Structured denial, present when `approved` is false
    pub denial: Option<DenialSummary>,
}

/// Serializable shape of a denial for API callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialSummary {
    AmountNotPositive,
    ActiveLoan,
    NoProfile,
    RiskTooHigh,
    ExceedsBorrowLimit,
    InsufficientLiquidity,
}

/// Confirmation of an executed disbursement.
#[derive(Debug, Clone, Serialize)]
pub struct Disbursement {
    pub user_address: Address,
    pub amount: u128,
    pub tx_hash: String,
    pub gas_used: Option<u64>,
}

/// Read-only repayment view over an active loan.
#[derive(Debug, Clone, Serialize)]
pub struct RepaymentInfo {
    pub loan: LoanRecord,
    pub accrued_interest: u128,
    pub total_due: u128,
    pub as_of: i64,
}

pub struct LoanGateway {
    ledger: Arc<dyn LedgerClient>,
    adapter: ScoreAdapter,
    prices: Option<Arc<dyn PriceFeed>>,
    feeds: PriceFeeds,
    timeouts: Timeouts,
}

impl LoanGateway {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        adapter: ScoreAdapter,
        prices: Option<Arc<dyn PriceFeed>>,
        feeds: PriceFeeds,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            ledger,
            adapter,
            prices,
            feeds,
            timeouts,
        }
    }

    /// Run the shared checklist against current ledger state. Returns
    /// the profile and pool balance on a full pass; a denial surfaces as
    /// `PolicyDenial` or `NoProfile`, a failed ledger read as its own
    /// error - never swallowed.
    async fn check_preconditions(
        &self,
        address: &Address,
        requested: u128,
    ) -> Result<(CreditProfile, u128)> {
        if requested == 0 {
            return Err(DenialReason::AmountNotPositive.into());
        }

        let loan = bounded(
            self.timeouts.ledger,
            "loan read",
            self.ledger.get_loan(address),
        )
        .await?;
        if loan.is_some_and(|l| l.active) {
            return Err(DenialReason::ActiveLoan.into());
        }

        let profile = bounded(
            self.timeouts.ledger,
            "profile read",
            self.ledger.get_credit_profile(address),
        )
        .await?;
        if profile.is_sentinel() {
            return Err(EmberlendError::NoProfile(address.to_string()));
        }

        if profile.combined_risk_score > policy::MAX_ACCEPTABLE_RISK {
            return Err(DenialReason::RiskTooHigh {
                risk: profile.combined_risk_score,
                ceiling: policy::MAX_ACCEPTABLE_RISK,
            }
            .into());
        }

        if requested > profile.max_borrow_amount {
            return Err(DenialReason::ExceedsBorrowLimit {
                requested,
                max_borrow: profile.max_borrow_amount,
            }
            .into());
        }

        let pool = bounded(
            self.timeouts.ledger,
            "pool balance read",
            self.ledger.get_pool_balance(),
        )
        .await?;
        if pool < requested {
            return Err(DenialReason::InsufficientLiquidity {
                available: pool,
                requested,
            }
            .into());
        }

        Ok((profile, pool))
    }

    /// Advisory evaluation: approve/deny with utilization-adjusted terms.
    ///
    /// Never mutates state, and is explicitly non-authoritative - ledger
    /// state can change between this answer and a disbursement attempt.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn evaluate(&self, address: &Address, requested: u128) -> Result<Decision> {
        let profile = match self.check_preconditions(address, requested).await {
            Ok((profile, _pool)) => profile,
            Err(EmberlendError::PolicyDenial(reason)) => {
                info!(%reason, "loan evaluation denied");
                return Ok(Decision::denied(requested, reason));
            }
            Err(EmberlendError::NoProfile(_)) => {
                info!("loan evaluation denied: no profile");
                return Ok(Decision::no_profile(requested));
            }
            Err(other) => return Err(other),
        };

        let util = utilization(requested, profile.max_borrow_amount);
        let premium = (util * f64::from(policy::MAX_UTILIZATION_PREMIUM_BPS)) as u16;
        let adjusted_apr = profile.apr_bps + premium;

        let loan_value_usd = self.loan_price().await.and_then(|p| usd_value(requested, p));
        let reason = self
            .rationale(&profile, requested, util, adjusted_apr)
            .await;

        info!(
            risk = profile.combined_risk_score,
            adjusted_apr_bps = adjusted_apr,
            "loan evaluation approved"
        );
        Ok(Decision {
            approved: true,
            reason,
            requested_amount: requested,
            max_borrow_amount: profile.max_borrow_amount,
            utilization: Some(util),
            base_apr_bps: Some(profile.apr_bps),
            adjusted_apr_bps: Some(adjusted_apr),
            utilization_premium_bps: Some(premium),
            loan_value_usd,
            denial: None,
        })
    }

    /// Authoritative disbursement: re-verifies every precondition from
    /// scratch immediately before instructing the ledger. Trusts nothing
    /// from a prior advisory call. Once the ledger transaction is
    /// submitted the operation is tracked to completion or explicit
    /// failure; it cannot be cancelled.
    #[instrument(skip(self), fields(address = %address))]
    pub async fn disburse(&self, address: &Address, requested: u128) -> Result<Disbursement> {
        self.check_preconditions(address, requested).await?;

        let receipt: TxReceipt = bounded(
            self.timeouts.ledger,
            "disbursement",
            self.ledger.disburse(address, requested),
        )
        .await
        .map_err(|err| match err {
            EmberlendError::LedgerRevert(reason) => {
                warn!(%reason, "disbursement reverted on-chain");
                EmberlendError::LedgerRevert(revert::decode(&reason))
            }
            other => other,
        })?;

        info!(tx_hash = %receipt.tx_hash, amount_tokens = to_tokens(requested), "loan disbursed");
        Ok(Disbursement {
            user_address: address.clone(),
            amount: requested,
            tx_hash: receipt.tx_hash,
            gas_used: receipt.gas_used,
        })
    }

    /// Current loan record for an address, if any loan was ever taken.
    pub async fn loan_status(&self, address: &Address) -> Result<Option<LoanRecord>> {
        bounded(
            self.timeouts.ledger,
            "loan read",
            self.ledger.get_loan(address),
        )
        .await
    }

    /// Repayment view over the active loan: principal plus simple
    /// interest accrued to now. `None` when there is no active loan.
    pub async fn repayment_info(&self, address: &Address) -> Result<Option<RepaymentInfo>> {
        let Some(loan) = self.loan_status(address).await? else {
            return Ok(None);
        };
        if !loan.active {
            return Ok(None);
        }

        let as_of = Utc::now().timestamp();
        let accrued_interest = loan.accrued_interest(as_of);
        Ok(Some(RepaymentInfo {
            loan,
            accrued_interest,
            total_due: loan.repayment_amount(as_of),
            as_of,
        }))
    }

    async fn loan_price(&self) -> Option<Decimal> {
        let feed = self.prices.as_ref()?;
        match bounded(
            self.timeouts.external,
            "price feed read",
            feed.get_prices(std::slice::from_ref(&self.feeds.loan)),
        )
        .await
        {
            Ok(prices) => prices.first().map(|p| p.price),
            Err(err) => {
                warn!(%err, "price feed unavailable, omitting USD valuation");
                None
            }
        }
    }

    /// Human-readable approval rationale via the reasoning collaborator,
    /// with a deterministic templated fallback.
    async fn rationale(
        &self,
        profile: &CreditProfile,
        requested: u128,
        util: f64,
        adjusted_apr: u16,
    ) -> String {
        let input = format!(
            "TradFi score: {}/1000, OnChain score: {}/100, Risk score: {}/100, \
             Requested: {:.0} tokens, Max allowed: {:.0} tokens, \
             Utilization: {:.1}%, APR: {:.2}%",
            profile.tradfi_score,
            profile.onchain_score,
            profile.combined_risk_score,
            to_tokens(requested),
            to_tokens(profile.max_borrow_amount),
            util * 100.0,
            f64::from(adjusted_apr) / 100.0,
        );

        match self.adapter.narrate(rubrics::RATIONALE, &input).await {
            Some(text) if !text.is_empty() => text,
            _ => templated_rationale(profile, requested, util, adjusted_apr),
        }
    }
}

impl Decision {
    fn denied(requested: u128, reason: DenialReason) -> Self {
        let (max_borrow, summary) = match &reason {
            DenialReason::AmountNotPositive => (0, DenialSummary::AmountNotPositive),
            DenialReason::ActiveLoan => (0, DenialSummary::ActiveLoan),
            DenialReason::RiskTooHigh { .. } => (0, DenialSummary::RiskTooHigh),
            DenialReason::ExceedsBorrowLimit { max_borrow, .. } => {
                (*max_borrow, DenialSummary::ExceedsBorrowLimit)
            }
            DenialReason::InsufficientLiquidity { .. } => (0, DenialSummary::InsufficientLiquidity),
        };

        Self {
            approved: false,
            reason: reason.to_string(),
            requested_amount: requested,
            max_borrow_amount: max_borrow,
            utilization: None,
            base_apr_bps: None,
            adjusted_apr_bps: None,
            utilization_premium_bps: None,
            loan_value_usd: None,
            denial: Some(summary),
        }
    }

    fn no_profile(requested: u128) -> Self {
        Self {
            approved: false,
            reason: "No credit profile on file. Run scoring first.".to_string(),
            requested_amount: requested,
            max_borrow_amount: 0,
            utilization: None,
            base_apr_bps: None,
            adjusted_apr_bps: None,
            utilization_premium_bps: None,
            loan_value_usd: None,
            denial: Some(DenialSummary::NoProfile),
        }
    }
}

/// Deterministic rationale used when the reasoning collaborator is
/// unavailable.
fn templated_rationale(
    profile: &CreditProfile,
    requested: u128,
    util: f64,
    adjusted_apr: u16,
) -> String {
    let tier = match profile.combined_risk_score {
        0..=20 => "excellent",
        21..=40 => "good",
        41..=60 => "fair",
        _ => "elevated",
    };

    format!(
        "Loan approved. Borrower has {tier} credit profile (risk {}/100, TradFi {}/1000, \
         OnChain {}/100). Requesting {:.0} of {:.0} max tokens ({:.1}% utilization) at \
         {:.2}% APR.",
        profile.combined_risk_score,
        profile.tradfi_score,
        profile.onchain_score,
        to_tokens(requested),
        to_tokens(profile.max_borrow_amount),
        util * 100.0,
        f64::from(adjusted_apr) / 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryLedger;
    use emberlend_common::policy::TOKEN;

    fn good_profile() -> CreditProfile {
        CreditProfile {
            tradfi_score: 900,
            onchain_score: 80,
            combined_risk_score: 14,
            max_borrow_amount: 50_000 * TOKEN,
            apr_bps: 342,
            valid_until: i64::MAX,
        }
    }

    async fn gateway_with_profile(
        pool: u128,
        profile: Option<CreditProfile>,
    ) -> (LoanGateway, Arc<InMemoryLedger>, Address) {
        let address = Address::new("0x01");
        let ledger = Arc::new(InMemoryLedger::new(pool));
        if let Some(profile) = profile {
            ledger
                .write_credit_profile(&address, &profile)
                .await
                .unwrap();
        }
        let gateway = LoanGateway::new(
            ledger.clone(),
            ScoreAdapter::disabled(),
            None,
            PriceFeeds::default(),
            Timeouts::default(),
        );
        (gateway, ledger, address)
    }

    #[tokio::test]
    async fn test_evaluate_approves_with_terms() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let decision = gateway.evaluate(&address, 25_000 * TOKEN).await.unwrap();
        assert!(decision.approved);
        assert_eq!(decision.utilization, Some(0.5));
        assert_eq!(decision.base_apr_bps, Some(342));
        assert_eq!(decision.utilization_premium_bps, Some(100));
        assert_eq!(decision.adjusted_apr_bps, Some(442));
        // Templated fallback rationale names the tier
        assert!(decision.reason.contains("excellent"));
    }

    #[tokio::test]
    async fn test_evaluate_denies_zero_amount() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let decision = gateway.evaluate(&address, 0).await.unwrap();
        assert!(!decision.approved);
        assert!(matches!(decision.denial, Some(DenialSummary::AmountNotPositive)));
    }

    #[tokio::test]
    async fn test_evaluate_denies_without_profile() {
        let (gateway, _, address) = gateway_with_profile(100_000 * TOKEN, None).await;

        let decision = gateway.evaluate(&address, 100 * TOKEN).await.unwrap();
        assert!(!decision.approved);
        assert!(matches!(decision.denial, Some(DenialSummary::NoProfile)));
    }

    #[tokio::test]
    async fn test_evaluate_denies_high_risk() {
        let profile = CreditProfile {
            combined_risk_score: 72,
            ..good_profile()
        };
        let (gateway, _, address) = gateway_with_profile(100_000 * TOKEN, Some(profile)).await;

        let decision = gateway.evaluate(&address, 100 * TOKEN).await.unwrap();
        assert!(!decision.approved);
        assert!(matches!(decision.denial, Some(DenialSummary::RiskTooHigh)));
    }

    #[tokio::test]
    async fn test_evaluate_denies_over_limit_and_reports_ceiling() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let decision = gateway.evaluate(&address, 60_000 * TOKEN).await.unwrap();
        assert!(!decision.approved);
        assert!(matches!(decision.denial, Some(DenialSummary::ExceedsBorrowLimit)));
        assert_eq!(decision.max_borrow_amount, 50_000 * TOKEN);
    }

    #[tokio::test]
    async fn test_evaluate_denies_active_loan() {
        let (gateway, ledger, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;
        ledger.disburse(&address, 100 * TOKEN).await.unwrap();

        let decision = gateway.evaluate(&address, 100 * TOKEN).await.unwrap();
        assert!(matches!(decision.denial, Some(DenialSummary::ActiveLoan)));
    }

    #[tokio::test]
    async fn test_disburse_happy_path() {
        let (gateway, ledger, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let disbursement = gateway.disburse(&address, 10_000 * TOKEN).await.unwrap();
        assert_eq!(disbursement.amount, 10_000 * TOKEN);
        assert_eq!(ledger.get_pool_balance().await.unwrap(), 90_000 * TOKEN);

        let loan = ledger.get_loan(&address).await.unwrap().unwrap();
        assert!(loan.active);
    }

    #[tokio::test]
    async fn test_evaluate_then_disburse_consistent_when_state_unchanged() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let decision = gateway.evaluate(&address, 5_000 * TOKEN).await.unwrap();
        assert!(decision.approved);

        // Nothing changed between the two calls: disburse must agree
        assert!(gateway.disburse(&address, 5_000 * TOKEN).await.is_ok());
    }

    #[tokio::test]
    async fn test_liquidity_drop_between_evaluate_and_disburse() {
        let (gateway, ledger, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        let decision = gateway.evaluate(&address, 5_000 * TOKEN).await.unwrap();
        assert!(decision.approved);

        // The pool drains before disbursement is attempted
        ledger.set_pool_balance(1_000 * TOKEN);

        let err = gateway.disburse(&address, 5_000 * TOKEN).await.unwrap_err();
        assert!(matches!(
            err,
            EmberlendError::PolicyDenial(DenialReason::InsufficientLiquidity { .. })
        ));
    }

    #[tokio::test]
    async fn test_disburse_denies_second_loan() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;

        gateway.disburse(&address, 1_000 * TOKEN).await.unwrap();
        let err = gateway.disburse(&address, 1_000 * TOKEN).await.unwrap_err();
        assert!(matches!(
            err,
            EmberlendError::PolicyDenial(DenialReason::ActiveLoan)
        ));
    }

    #[tokio::test]
    async fn test_repayment_info_for_active_loan() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;
        gateway.disburse(&address, 2_000 * TOKEN).await.unwrap();

        let info = gateway.repayment_info(&address).await.unwrap().unwrap();
        assert_eq!(info.loan.principal, 2_000 * TOKEN);
        assert!(info.total_due >= info.loan.principal);
    }

    #[tokio::test]
    async fn test_repayment_info_none_without_loan() {
        let (gateway, _, address) =
            gateway_with_profile(100_000 * TOKEN, Some(good_profile())).await;
        assert!(gateway.repayment_info(&address).await.unwrap().is_none());
    }
}
