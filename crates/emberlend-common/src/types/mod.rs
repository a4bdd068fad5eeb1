//! Core data types for the Emberlend underwriting system

pub mod address;
pub mod context;
pub mod profile;
pub mod snapshot;
