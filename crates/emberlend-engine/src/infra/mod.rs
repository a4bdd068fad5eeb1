//! In-process collaborator implementations
//!
//! Concrete backends for the collaborator traits, used by tests and by
//! the service's demo wiring. The in-memory ledger enforces the same
//! lending conditions the on-chain contract enforces, so gateway tests
//! exercise real revert paths.

pub mod memory_ledger;
pub mod price_feed;
pub mod randomness;
pub mod synthetic;

pub use memory_ledger::InMemoryLedger;
pub use price_feed::StaticPriceFeed;
pub use randomness::OsRandomness;
pub use synthetic::SyntheticSnapshots;
