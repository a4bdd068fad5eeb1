//! TradFi signal collector
//!
//! Obtains financial-history attributes through the attested external
//! fetch (or deterministic synthesis as last resort) and reduces them to
//! a 0-1000 score. Every failure in this stage is recovered locally;
//! nothing surfaces to the orchestrator.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use emberlend_common::{policy, Address, FinancialSnapshot};

use crate::clients::SnapshotFetcher;
use crate::deadline::{bounded, Timeouts};
use crate::scoring::{rubrics, ScoreAdapter};

/// Partial context update produced by this collector.
#[derive(Debug, Clone, Copy)]
pub struct TradFiSignal {
    pub tradfi_score: u16,
}

pub struct TradFiCollector {
    fetcher: Arc<dyn SnapshotFetcher>,
    adapter: ScoreAdapter,
    timeouts: Timeouts,
}

impl TradFiCollector {
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>, adapter: ScoreAdapter, timeouts: Timeouts) -> Self {
        Self {
            fetcher,
            adapter,
            timeouts,
        }
    }

    /// Collect the TradFi signal. Infallible by policy: external-data
    /// unavailability falls back to synthesis, scoring failure to the
    /// rule-based formula.
    pub async fn collect(&self, address: &Address) -> TradFiSignal {
        let snapshot = match bounded(
            self.timeouts.external,
            "snapshot fetch",
            self.fetcher.fetch_snapshot(address),
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%address, %err, "attested snapshot unavailable, synthesizing deterministically");
                FinancialSnapshot::synthesize(address)
            }
        };

        let tradfi_score = self.score(&snapshot).await;
        info!(%address, tradfi_score, fico = snapshot.bureau.fico_score, "tradfi signal collected");

        TradFiSignal { tradfi_score }
    }

    async fn score(&self, snapshot: &FinancialSnapshot) -> u16 {
        #[derive(Deserialize)]
        struct Reply {
            tradfi_score: i64,
        }

        let Ok(input) = serde_json::to_value(snapshot) else {
            return rule_based_score(snapshot);
        };

        match self
            .adapter
            .try_score::<Reply>("tradfi", rubrics::TRADFI, &input)
            .await
        {
            Some(reply) => reply.tradfi_score.clamp(0, policy::TRADFI_SCORE_MAX as i64) as u16,
            None => rule_based_score(snapshot),
        }
    }
}

/// Deterministic 0-1000 scoring formula.
///
/// FICO-equivalent carries ~40% of the scale, payment history ~30%,
/// banking health ~20%, and credit utilization a direct penalty.
pub fn rule_based_score(snapshot: &FinancialSnapshot) -> u16 {
    let fico_component = f64::from(snapshot.bureau.fico_score.saturating_sub(300)) / 550.0 * 400.0;
    let payment_component = snapshot.payments.on_time_ratio() * 300.0;

    let total_savings = snapshot.banking.checking_balance + snapshot.banking.savings_balance;
    let savings_component = (total_savings / 25_000.0).min(1.0) * 200.0;

    let utilization_penalty = -snapshot.bureau.credit_utilization_percent;

    let score = fico_component + payment_component + savings_component + utilization_penalty;
    score.clamp(0.0, f64::from(policy::TRADFI_SCORE_MAX)) as u16
}
