//! Bounded timeouts for outbound collaborator calls
//!
//! Every call that leaves the process gets a deadline; expiry is treated
//! like any other failure of that collaborator (fallback or typed error,
//! per component).

use std::future::Future;
use std::time::Duration;

use emberlend_common::{EmberlendError, Result};

/// Per-collaborator call deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Ledger reads and writes
    pub ledger: Duration,
    /// Attested external-data and price-feed fetches
    pub external: Duration,
    /// Intelligent-scoring completions
    pub scoring: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            ledger: Duration::from_secs(5),
            external: Duration::from_secs(10),
            scoring: Duration::from_secs(20),
        }
    }
}

/// Await `fut` for at most `limit`; expiry maps to a `Timeout` error
/// naming the call.
pub async fn bounded<T>(
    limit: Duration,
    label: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(EmberlendError::Timeout(format!(
            "{label} exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_passes_through_ok() {
        let out = bounded(Duration::from_secs(1), "noop", async { Ok(7u32) }).await;
        assert_eq!(out.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_maps_expiry_to_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0u32)
        };
        let out = bounded(Duration::from_millis(10), "slow call", slow).await;
        assert!(matches!(out, Err(EmberlendError::Timeout(_))));
    }
}
