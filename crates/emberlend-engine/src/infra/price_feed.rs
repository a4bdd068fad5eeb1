//! Fixed-price feed
//!
//! Serves configured USD prices for known feeds; unknown feeds read as
//! unavailable, exercising the collectors' omit-USD path.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use emberlend_common::{EmberlendError, Result};

use crate::clients::{FeedId, FeedPrice, PriceFeed};

pub struct StaticPriceFeed {
    prices: HashMap<FeedId, Decimal>,
}

impl StaticPriceFeed {
    pub fn new(prices: Vec<(FeedId, Decimal)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PriceFeed for StaticPriceFeed {
    async fn get_prices(&self, feeds: &[FeedId]) -> Result<Vec<FeedPrice>> {
        feeds
            .iter()
            .map(|feed| {
                self.prices
                    .get(feed)
                    .map(|price| FeedPrice { price: *price })
                    .ok_or_else(|| {
                        EmberlendError::DataUnavailable(format!("no price for feed {}", feed.0))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_known_feeds_priced_in_order() {
        let feed = StaticPriceFeed::new(vec![
            (FeedId::new("ETH/USD"), dec!(2000)),
            (FeedId::new("USDC/USD"), dec!(1)),
        ]);
        let prices = feed
            .get_prices(&[FeedId::new("USDC/USD"), FeedId::new("ETH/USD")])
            .await
            .unwrap();
        assert_eq!(prices[0].price, dec!(1));
        assert_eq!(prices[1].price, dec!(2000));
    }

    #[tokio::test]
    async fn test_unknown_feed_unavailable() {
        let feed = StaticPriceFeed::new(vec![]);
        let err = feed.get_prices(&[FeedId::new("XRP/USD")]).await.unwrap_err();
        assert!(matches!(err, EmberlendError::DataUnavailable(_)));
    }
}
