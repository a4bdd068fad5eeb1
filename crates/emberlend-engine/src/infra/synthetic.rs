//! Deterministic snapshot source
//!
//! Stands in for the attested external-data collaborator. Serves the
//! address-seeded synthetic snapshot, or reports itself unavailable to
//! exercise the collector's fallback path.

use async_trait::async_trait;

use emberlend_common::{Address, EmberlendError, FinancialSnapshot, Result};

use crate::clients::SnapshotFetcher;

pub struct SyntheticSnapshots {
    available: bool,
}

impl SyntheticSnapshots {
    pub fn new() -> Self {
        Self { available: true }
    }

    pub fn unavailable() -> Self {
        Self { available: false }
    }
}

impl Default for SyntheticSnapshots {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotFetcher for SyntheticSnapshots {
    async fn fetch_snapshot(&self, address: &Address) -> Result<FinancialSnapshot> {
        if !self.available {
            return Err(EmberlendError::DataUnavailable(
                "attestation verifier unreachable".into(),
            ));
        }
        Ok(FinancialSnapshot::synthesize(address))
    }
}
