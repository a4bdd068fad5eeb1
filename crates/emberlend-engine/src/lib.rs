//! # Emberlend Engine
//!
//! The scoring-and-underwriting core: concurrent multi-source data
//! collection, risk aggregation with graceful fallback, on-chain profile
//! submission, and the two-phase loan decision gateway.
//!
//! ## Pipeline
//!
//! ```text
//! START ──┬─ TradFi collector  ──┐
//!         │                      ├─ MERGE ─ Risk aggregator ─ Submission ─ DONE
//!         └─ OnChain collector ──┘
//! ```
//!
//! The two collectors touch disjoint external systems and run
//! concurrently; aggregation and submission run sequentially after the
//! join barrier. Every intelligent-scoring call degrades to a
//! deterministic rule-based formula, so the pipeline completes whenever
//! the ledger itself is reachable.
//!
//! ## Decision protocol
//!
//! [`LoanGateway::evaluate`] is a fast advisory quote over the
//! last-submitted profile; [`LoanGateway::disburse`] re-verifies every
//! precondition from current ledger state before moving funds, because
//! the advisory answer may be stale by the time disbursement is
//! attempted. The ledger contract re-enforces the same checks on-chain
//! as the ultimate authority.

pub mod clients;
pub mod collect;
pub mod deadline;
pub mod gateway;
pub mod infra;
pub mod orchestrator;
pub mod risk;
pub mod scoring;
pub mod submission;

pub use clients::{
    FeedId, FeedPrice, LedgerClient, PriceFeed, RandomDraw, RandomnessSource, ScoringService,
    SnapshotFetcher, TxReceipt,
};
pub use collect::{onchain::OnChainCollector, onchain::PriceFeeds, tradfi::TradFiCollector};
pub use deadline::Timeouts;
pub use gateway::{Decision, Disbursement, LoanGateway, RepaymentInfo};
pub use orchestrator::Underwriter;
pub use risk::RiskAggregator;
pub use scoring::ScoreAdapter;
pub use submission::SubmissionAgent;
