//! Score provider adapter and stage rubrics
//!
//! All three scoring stages (TradFi, OnChain, risk aggregation) try the
//! intelligent scoring service first and fall back to a deterministic
//! rule-based formula through the same combinator.

pub mod adapter;
pub mod rubrics;

pub use adapter::ScoreAdapter;
