//! Risk aggregator
//!
//! Combines the TradFi and OnChain signals into a combined risk score, a
//! max-borrow ceiling, and an APR; applies a bounded verifiable-random
//! jitter to the APR; and computes the approved amount against any
//! requested amount. Failures recover locally: intelligent assessment
//! falls back to the weighted formula, randomness failure skips jitter.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use emberlend_common::types::context::{to_tokens, usd_value, utilization};
use emberlend_common::{policy, UnderwritingContext};

use crate::clients::RandomnessSource;
use crate::deadline::{bounded, Timeouts};
use crate::scoring::{rubrics, ScoreAdapter};

/// Terms derived from the two signals, before jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Terms {
    combined_risk_score: u8,
    max_borrow_amount: u128,
    apr_bps: u16,
}

pub struct RiskAggregator {
    adapter: ScoreAdapter,
    randomness: Option<Arc<dyn RandomnessSource>>,
    timeouts: Timeouts,
}

impl RiskAggregator {
    pub fn new(
        adapter: ScoreAdapter,
        randomness: Option<Arc<dyn RandomnessSource>>,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            adapter,
            randomness,
            timeouts,
        }
    }

    /// Fill in risk score, borrow ceiling, APR, approved amount, and
    /// validity on a context carrying both collected signals. Infallible
    /// by policy; no error escapes this stage.
    pub async fn assess(&self, ctx: &mut UnderwritingContext) {
        let terms = match self.assess_intelligent(ctx).await {
            Some(terms) => terms,
            None => rule_based_terms(ctx.tradfi_score, ctx.onchain_score, ctx.requested_amount),
        };

        ctx.combined_risk_score = terms.combined_risk_score;
        ctx.max_borrow_amount = terms.max_borrow_amount;
        ctx.apr_bps = terms.apr_bps;

        self.apply_jitter(ctx).await;

        ctx.approved_amount = if ctx.requested_amount > 0 {
            ctx.requested_amount.min(ctx.max_borrow_amount)
        } else {
            ctx.max_borrow_amount
        };

        ctx.valid_until = Utc::now().timestamp() + policy::PROFILE_VALIDITY_DAYS * 24 * 60 * 60;

        if let Some(price) = ctx.loan_price_usd {
            ctx.loan_value_usd = usd_value(ctx.approved_amount, price);
            ctx.max_borrow_usd = usd_value(ctx.max_borrow_amount, price);
        }

        info!(
            address = %ctx.user_address,
            risk = ctx.combined_risk_score,
            max_borrow_tokens = to_tokens(ctx.max_borrow_amount),
            apr_bps = ctx.apr_bps,
            jitter_bps = ctx.rng_jitter_bps,
            "risk assessment complete"
        );
    }

    async fn assess_intelligent(&self, ctx: &UnderwritingContext) -> Option<Terms> {
        #[derive(Deserialize)]
        struct Reply {
            combined_risk_score: i64,
            max_borrow_amount_tokens: i64,
            apr_basis_points: i64,
        }

        let requested = if ctx.requested_amount > 0 {
            json!(to_tokens(ctx.requested_amount))
        } else {
            json!("not specified")
        };
        let input = json!({
            "tradfi_score": ctx.tradfi_score,
            "tradfi_score_range": "0-1000 (higher = more creditworthy)",
            "onchain_score": ctx.onchain_score,
            "onchain_score_range": "0-100 (higher = better reputation)",
            "requested_amount_tokens": requested,
        });

        let reply = self
            .adapter
            .try_score::<Reply>("risk", rubrics::RISK, &input)
            .await?;

        let tokens = reply.max_borrow_amount_tokens.clamp(1_000, 50_000) as u128;
        Some(Terms {
            combined_risk_score: reply.combined_risk_score.clamp(0, 100) as u8,
            max_borrow_amount: tokens * policy::TOKEN,
            apr_bps: policy::clamp_apr(reply.apr_basis_points.clamp(0, 10_000) as i32),
        })
    }

    /// Draw from the verifiable randomness source and move APR by up to
    /// ±50 bps, keeping it inside the allowed band. A randomness failure
    /// skips jitter without failing the pipeline.
    async fn apply_jitter(&self, ctx: &mut UnderwritingContext) {
        let Some(randomness) = self.randomness.as_ref() else {
            return;
        };

        match bounded(self.timeouts.external, "randomness draw", randomness.get_random()).await {
            Ok(draw) => {
                let jitter = (draw.value % 101) as i16 - policy::APR_JITTER_BPS;
                ctx.apr_bps = policy::clamp_apr(i32::from(ctx.apr_bps) + i32::from(jitter));
                ctx.rng_jitter_bps = Some(jitter);
                info!(jitter_bps = jitter, is_secure = draw.is_secure, "applied APR jitter");
            }
            Err(err) => {
                warn!(%err, "randomness source unavailable, skipping APR jitter");
            }
        }
    }
}

/// Weighted rule-based fallback: 60% TradFi risk, 40% OnChain risk.
fn rule_based_terms(tradfi_score: u16, onchain_score: u8, requested_amount: u128) -> Terms {
    let tradfi_risk = f64::from(policy::TRADFI_SCORE_MAX.saturating_sub(tradfi_score)) / 10.0;
    let onchain_risk = f64::from(policy::ONCHAIN_SCORE_MAX.saturating_sub(onchain_score));
    let combined_risk_score = (tradfi_risk * 0.6 + onchain_risk * 0.4) as u8;

    let max_borrow_amount = policy::max_borrow_for_risk(combined_risk_score);
    let base_apr = policy::APR_MIN_BPS + u16::from(combined_risk_score) * 3;

    let apr_bps = if requested_amount > 0 {
        let util_premium =
            (utilization(requested_amount, max_borrow_amount) * f64::from(policy::MAX_UTILIZATION_PREMIUM_BPS)) as u16;
        let amount_premium = amount_premium_bps(requested_amount);
        policy::clamp_apr(i32::from(base_apr) + i32::from(util_premium) + i32::from(amount_premium))
    } else {
        policy::clamp_apr(i32::from(base_apr))
    };

    Terms {
        combined_risk_score,
        max_borrow_amount,
        apr_bps,
    }
}

/// Flat premium for large loans: +50 bps above 20000 tokens, +25 above
/// 10000.
fn amount_premium_bps(requested_amount: u128) -> u16 {
    let tokens = requested_amount / policy::TOKEN;
    if tokens > 20_000 {
        50
    } else if tokens > 10_000 {
        25
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{MockScoring, RandomDraw};
    use async_trait::async_trait;
    use emberlend_common::policy::TOKEN;
    use emberlend_common::{Address, EmberlendError, Result};
    use std::time::Duration;

    struct FixedRandom(u128);

    #[async_trait]
    impl RandomnessSource for FixedRandom {
        async fn get_random(&self) -> Result<RandomDraw> {
            Ok(RandomDraw {
                value: self.0,
                is_secure: true,
            })
        }
    }

    struct DownRandom;

    #[async_trait]
    impl RandomnessSource for DownRandom {
        async fn get_random(&self) -> Result<RandomDraw> {
            Err(EmberlendError::DataUnavailable("rng down".into()))
        }
    }

    fn ctx_with_scores(tradfi: u16, onchain: u8, requested: u128) -> UnderwritingContext {
        let mut ctx = UnderwritingContext::new(Address::new("0x01"), requested);
        ctx.tradfi_score = tradfi;
        ctx.onchain_score = onchain;
        ctx
    }

    #[test]
    fn test_rule_based_excellent_borrower() {
        // tradfi 900, onchain 80: risk = 10*0.6 + 20*0.4 = 14
        let terms = rule_based_terms(900, 80, 0);
        assert_eq!(terms.combined_risk_score, 14);
        assert_eq!(terms.max_borrow_amount, 50_000 * TOKEN);
        assert_eq!(terms.apr_bps, 342);
    }

    #[test]
    fn test_rule_based_worst_borrower() {
        let terms = rule_based_terms(0, 0, 0);
        assert_eq!(terms.combined_risk_score, 100);
        assert_eq!(terms.max_borrow_amount, 1_000 * TOKEN);
        assert_eq!(terms.apr_bps, 600);
    }

    #[test]
    fn test_utilization_and_amount_premiums() {
        // risk 14 -> ceiling 50000; request 25000 = 50% utilization
        let terms = rule_based_terms(900, 80, 25_000 * TOKEN);
        // 342 + 100 utilization + 50 amount premium
        assert_eq!(terms.apr_bps, 492);
    }

    #[test]
    fn test_apr_clamped_after_premiums() {
        // risk 60 -> base 480, full utilization (+200) and large amount
        // would push past the ceiling
        let terms = rule_based_terms(400, 40, 50_000 * TOKEN);
        assert!(terms.apr_bps <= 600);
    }

    #[tokio::test]
    async fn test_assess_requested_zero_approves_ceiling() {
        let aggregator =
            RiskAggregator::new(ScoreAdapter::disabled(), None, Timeouts::default());
        let mut ctx = ctx_with_scores(900, 80, 0);
        aggregator.assess(&mut ctx).await;

        assert_eq!(ctx.approved_amount, ctx.max_borrow_amount);
        assert_eq!(ctx.apr_bps, 342);
        assert!(ctx.rng_jitter_bps.is_none());
        assert!(ctx.valid_until > Utc::now().timestamp() + 29 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_assess_caps_approved_at_ceiling() {
        let aggregator =
            RiskAggregator::new(ScoreAdapter::disabled(), None, Timeouts::default());
        let mut ctx = ctx_with_scores(100, 5, 80_000 * TOKEN);
        aggregator.assess(&mut ctx).await;

        assert!(ctx.approved_amount <= ctx.max_borrow_amount);
        assert_eq!(ctx.approved_amount, ctx.max_borrow_amount);
    }

    #[tokio::test]
    async fn test_jitter_applied_and_recorded() {
        // value 100 -> jitter = 100 % 101 - 50 = +50
        let aggregator = RiskAggregator::new(
            ScoreAdapter::disabled(),
            Some(Arc::new(FixedRandom(100))),
            Timeouts::default(),
        );
        let mut ctx = ctx_with_scores(900, 80, 0);
        aggregator.assess(&mut ctx).await;

        assert_eq!(ctx.rng_jitter_bps, Some(50));
        assert_eq!(ctx.apr_bps, 392);
    }

    #[tokio::test]
    async fn test_jitter_clamped_at_apr_floor() {
        // value 0 -> jitter -50; excellent borrower near the floor
        let aggregator = RiskAggregator::new(
            ScoreAdapter::disabled(),
            Some(Arc::new(FixedRandom(0))),
            Timeouts::default(),
        );
        let mut ctx = ctx_with_scores(1000, 100, 0);
        aggregator.assess(&mut ctx).await;

        assert_eq!(ctx.rng_jitter_bps, Some(-50));
        assert_eq!(ctx.apr_bps, 300);
    }

    #[tokio::test]
    async fn test_randomness_failure_skips_jitter() {
        let aggregator = RiskAggregator::new(
            ScoreAdapter::disabled(),
            Some(Arc::new(DownRandom)),
            Timeouts::default(),
        );
        let mut ctx = ctx_with_scores(900, 80, 0);
        aggregator.assess(&mut ctx).await;

        assert!(ctx.rng_jitter_bps.is_none());
        assert_eq!(ctx.apr_bps, 342);
    }

    #[tokio::test]
    async fn test_intelligent_terms_clamped() {
        let mut mock = MockScoring::new();
        mock.expect_complete().returning(|_, _| {
            Ok(r#"{"combined_risk_score": 180, "max_borrow_amount_tokens": 900000, "apr_basis_points": 9999, "reasoning": "x"}"#.to_string())
        });

        let aggregator = RiskAggregator::new(
            ScoreAdapter::new(Some(Arc::new(mock)), Duration::from_secs(1)),
            None,
            Timeouts::default(),
        );
        let mut ctx = ctx_with_scores(500, 50, 0);
        aggregator.assess(&mut ctx).await;

        assert_eq!(ctx.combined_risk_score, 100);
        assert_eq!(ctx.max_borrow_amount, 50_000 * TOKEN);
        assert_eq!(ctx.apr_bps, 600);
    }

    #[tokio::test]
    async fn test_malformed_assessment_falls_back_to_formula() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Ok("the borrower looks fine to me".to_string()));

        let aggregator = RiskAggregator::new(
            ScoreAdapter::new(Some(Arc::new(mock)), Duration::from_secs(1)),
            None,
            Timeouts::default(),
        );
        let mut ctx = ctx_with_scores(900, 80, 0);
        aggregator.assess(&mut ctx).await;

        assert_eq!(ctx.combined_risk_score, 14);
        assert_eq!(ctx.apr_bps, 342);
    }
}
