//! OnChain signal collector
//!
//! Reads wallet balance and transaction count from the ledger, derives
//! activity/age estimates, optionally enriches with live price-feed data
//! for USD valuation, and reduces everything to a 0-100 score.
//!
//! Ledger reads are required: their failure is the one error this stage
//! surfaces. Price-feed failure only omits the USD fields.

use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use emberlend_common::types::context::{to_tokens, usd_value};
use emberlend_common::{policy, Address, Result};

use crate::clients::{FeedId, LedgerClient, PriceFeed};
use crate::deadline::{bounded, Timeouts};
use crate::scoring::{rubrics, ScoreAdapter};

/// The price feeds used for USD enrichment.
#[derive(Debug, Clone)]
pub struct PriceFeeds {
    /// Native-asset feed (wallet balance valuation)
    pub native: FeedId,
    /// Loan-asset feed (loan valuation)
    pub loan: FeedId,
}

impl Default for PriceFeeds {
    fn default() -> Self {
        Self {
            native: FeedId::new("ETH/USD"),
            loan: FeedId::new("USDC/USD"),
        }
    }
}

/// Partial context update produced by this collector.
#[derive(Debug, Clone, Copy)]
pub struct OnChainSignal {
    pub balance: u128,
    pub transaction_count: u64,
    pub wallet_age_days: u32,
    pub is_active_user: bool,
    pub onchain_score: u8,
    pub native_price_usd: Option<Decimal>,
    pub loan_price_usd: Option<Decimal>,
}

pub struct OnChainCollector {
    ledger: Arc<dyn LedgerClient>,
    prices: Option<Arc<dyn PriceFeed>>,
    feeds: PriceFeeds,
    adapter: ScoreAdapter,
    timeouts: Timeouts,
}

impl OnChainCollector {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        prices: Option<Arc<dyn PriceFeed>>,
        feeds: PriceFeeds,
        adapter: ScoreAdapter,
        timeouts: Timeouts,
    ) -> Self {
        Self {
            ledger,
            prices,
            feeds,
            adapter,
            timeouts,
        }
    }

    pub async fn collect(&self, address: &Address) -> Result<OnChainSignal> {
        let balance = bounded(
            self.timeouts.ledger,
            "balance read",
            self.ledger.get_balance(address),
        )
        .await?;
        let transaction_count = bounded(
            self.timeouts.ledger,
            "transaction count read",
            self.ledger.get_transaction_count(address),
        )
        .await?;

        let wallet_age_days = estimate_wallet_age(transaction_count);
        let is_active_user = transaction_count > 0;

        let (native_price_usd, loan_price_usd) = self.fetch_prices().await;
        let balance_usd = native_price_usd.and_then(|price| usd_value(balance, price));

        let onchain_score = self
            .score(
                balance,
                balance_usd,
                transaction_count,
                wallet_age_days,
                is_active_user,
            )
            .await;

        info!(
            %address,
            onchain_score,
            transaction_count,
            wallet_age_days,
            "onchain signal collected"
        );

        Ok(OnChainSignal {
            balance,
            transaction_count,
            wallet_age_days,
            is_active_user,
            onchain_score,
            native_price_usd,
            loan_price_usd,
        })
    }

    /// Price-feed enrichment is best-effort: a failure logs and omits
    /// the USD fields.
    async fn fetch_prices(&self) -> (Option<Decimal>, Option<Decimal>) {
        let Some(feed) = self.prices.as_ref() else {
            return (None, None);
        };

        let feeds = [self.feeds.native.clone(), self.feeds.loan.clone()];
        match bounded(self.timeouts.external, "price feed read", feed.get_prices(&feeds)).await {
            Ok(prices) if prices.len() == 2 => (Some(prices[0].price), Some(prices[1].price)),
            Ok(prices) => {
                warn!(returned = prices.len(), "price feed returned wrong feed count");
                (None, None)
            }
            Err(err) => {
                warn!(%err, "price feed unavailable, omitting USD valuation");
                (None, None)
            }
        }
    }

    async fn score(
        &self,
        balance: u128,
        balance_usd: Option<Decimal>,
        transaction_count: u64,
        wallet_age_days: u32,
        is_active_user: bool,
    ) -> u8 {
        #[derive(Deserialize)]
        struct Reply {
            onchain_score: i64,
        }

        let input = json!({
            "balance_tokens": to_tokens(balance),
            "balance_usd": balance_usd,
            "transaction_count": transaction_count,
            "wallet_age_days": wallet_age_days,
            "is_active_user": is_active_user,
        });

        match self
            .adapter
            .try_score::<Reply>("onchain", rubrics::ONCHAIN, &input)
            .await
        {
            Some(reply) => reply.onchain_score.clamp(0, policy::ONCHAIN_SCORE_MAX as i64) as u8,
            None => rule_based_score(balance, balance_usd, transaction_count, wallet_age_days, is_active_user),
        }
    }
}

/// Wallet age estimated from activity: one transaction per week on
/// average, capped at two years.
pub fn estimate_wallet_age(transaction_count: u64) -> u32 {
    if transaction_count == 0 {
        return 0;
    }
    let estimated = transaction_count.saturating_mul(policy::DAYS_PER_TRANSACTION as u64);
    estimated.min(policy::WALLET_AGE_CAP_DAYS as u64) as u32
}

/// Deterministic 0-100 reputation formula: tiered transaction-count,
/// balance-value, and wallet-age contributions plus an active-user bonus.
pub fn rule_based_score(
    balance: u128,
    balance_usd: Option<Decimal>,
    transaction_count: u64,
    wallet_age_days: u32,
    is_active_user: bool,
) -> u8 {
    let mut score: u32 = 0;

    score += match transaction_count {
        tx if tx > 100 => 30,
        tx if tx > 50 => 25,
        tx if tx > 20 => 20,
        tx if tx > 10 => 15,
        tx if tx > 5 => 10,
        _ => 0,
    };

    // Prefer USD value when the feed answered, else native units
    let value = balance_usd
        .and_then(|usd| usd.to_f64())
        .unwrap_or_else(|| to_tokens(balance));
    score += match value {
        v if v > 100.0 => 30,
        v if v > 50.0 => 25,
        v if v > 10.0 => 20,
        v if v > 5.0 => 15,
        v if v > 1.0 => 10,
        v if v > 0.1 => 5,
        _ => 0,
    };

    score += match wallet_age_days {
        age if age > 365 => 25,
        age if age > 180 => 20,
        age if age > 90 => 15,
        age if age > 30 => 10,
        age if age > 7 => 5,
        _ => 0,
    };

    if is_active_user {
        score += 15;
    }

    score.min(policy::ONCHAIN_SCORE_MAX as u32) as u8
}
