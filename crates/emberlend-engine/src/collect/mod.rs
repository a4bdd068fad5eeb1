//! Signal collectors - the concurrent fan-out stage of the pipeline
//!
//! TradFi and OnChain collectors touch disjoint external systems and
//! produce independent partial updates the orchestrator merges.

pub mod onchain;
pub mod tradfi;

pub use onchain::{OnChainCollector, OnChainSignal};
pub use tradfi::{TradFiCollector, TradFiSignal};
