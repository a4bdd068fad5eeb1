//! Emberlend service binary
//!
//! Loads configuration, initializes tracing, wires the underwriting
//! pipeline and loan gateway over the demo collaborator set, and serves
//! the REST API.

mod config;
mod routes;
mod scoring;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal_macros::dec;
use tracing::info;

use emberlend_common::policy::TOKEN;
use emberlend_common::Address;
use emberlend_engine::infra::{InMemoryLedger, OsRandomness, StaticPriceFeed, SyntheticSnapshots};
use emberlend_engine::{
    FeedId, LoanGateway, OnChainCollector, PriceFeeds, RiskAggregator, ScoreAdapter, ScoringService,
    SubmissionAgent, Timeouts, TradFiCollector, Underwriter,
};

use crate::config::ServiceConfig;
use crate::routes::AppState;
use crate::scoring::HttpScoringService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("emberlend_service=info".parse()?)
                .add_directive("emberlend_engine=info".parse()?),
        )
        .init();

    let cfg = ServiceConfig::load()?;
    let state = build_state(&cfg);

    let app = routes::router(state);
    let addr = cfg.bind_address();
    info!(%addr, pool_tokens = cfg.pool_tokens, "Emberlend service starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Emberlend service stopped");
    Ok(())
}

fn build_state(cfg: &ServiceConfig) -> AppState {
    let timeouts = Timeouts::default();

    let ledger = Arc::new(InMemoryLedger::new(u128::from(cfg.pool_tokens) * TOKEN));
    seed_demo_wallets(&ledger);

    let scoring: Option<Arc<dyn ScoringService>> = HttpScoringService::from_settings(&cfg.scoring)
        .map(|svc| Arc::new(svc) as Arc<dyn ScoringService>);
    if scoring.is_some() {
        info!(model = %cfg.scoring.model, "intelligent scoring backend configured");
    } else {
        info!("no scoring backend configured, using rule-based formulas");
    }
    let adapter = ScoreAdapter::new(scoring, Duration::from_secs(20));

    let price_feed = Arc::new(StaticPriceFeed::new(vec![
        (FeedId::new("ETH/USD"), dec!(2000)),
        (FeedId::new("USDC/USD"), dec!(1)),
    ]));
    let feeds = PriceFeeds::default();

    let underwriter = Underwriter::new(
        TradFiCollector::new(
            Arc::new(SyntheticSnapshots::new()),
            adapter.clone(),
            timeouts,
        ),
        OnChainCollector::new(
            ledger.clone(),
            Some(price_feed.clone()),
            feeds.clone(),
            adapter.clone(),
            timeouts,
        ),
        RiskAggregator::new(adapter.clone(), Some(Arc::new(OsRandomness)), timeouts),
        SubmissionAgent::new(ledger.clone(), timeouts),
    );

    let gateway = LoanGateway::new(ledger, adapter, Some(price_feed), feeds, timeouts);

    AppState {
        underwriter: Arc::new(underwriter),
        gateway: Arc::new(gateway),
    }
}

/// Seed a few wallets so scoring has on-chain activity to read in demo
/// runs.
fn seed_demo_wallets(ledger: &InMemoryLedger) {
    let demo: [(&str, u128, u64); 3] = [
        ("0x1234567890abcdef1234567890abcdef12345678", 50, 120),
        ("0xabcdef0123456789abcdef0123456789abcdef01", 5, 15),
        ("0x9876543210fedcba9876543210fedcba98765432", 200, 450),
    ];
    for (address, tokens, tx_count) in demo {
        ledger.set_wallet(&Address::new(address), tokens * TOKEN, tx_count);
    }
    info!(wallets = demo.len(), "seeded demo wallets");
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
