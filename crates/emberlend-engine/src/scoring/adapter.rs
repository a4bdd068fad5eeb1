//! Try-primary-then-fallback combinator over the scoring service
//!
//! The service is optional and unreliable; every consumer supplies a
//! deterministic fallback, so a failure here never escapes a pipeline
//! stage.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use emberlend_common::Result;

use crate::clients::ScoringService;
use crate::deadline::bounded;

/// Adapter over the optional intelligent scoring backend.
#[derive(Clone)]
pub struct ScoreAdapter {
    service: Option<Arc<dyn ScoringService>>,
    timeout: Duration,
}

impl ScoreAdapter {
    pub fn new(service: Option<Arc<dyn ScoringService>>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// An adapter with no backend; every call takes the fallback path.
    pub fn disabled() -> Self {
        Self {
            service: None,
            timeout: Duration::from_secs(0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_some()
    }

    /// Submit structured input under a rubric and parse a strict JSON
    /// reply. Returns `None` when the service is unconfigured, times
    /// out, errors, or replies with anything that does not parse - the
    /// caller then uses its rule-based formula.
    pub async fn try_score<T: DeserializeOwned>(
        &self,
        stage: &str,
        rubric: &str,
        input: &Value,
    ) -> Option<T> {
        let service = self.service.as_ref()?;

        let raw = match bounded(
            self.timeout,
            stage,
            service.complete(rubric, &input.to_string()),
        )
        .await
        {
            Ok(raw) => raw,
            Err(err) => {
                warn!(stage, %err, "scoring service call failed, using rule-based fallback");
                return None;
            }
        };

        match parse_strict_json(&raw) {
            Ok(parsed) => {
                debug!(stage, "scoring service reply accepted");
                Some(parsed)
            }
            Err(err) => {
                warn!(stage, %err, "scoring service reply malformed, using rule-based fallback");
                None
            }
        }
    }

    /// Plain-text completion for the evaluate-path rationale. `None` on
    /// any failure; the gateway then renders its templated fallback.
    pub async fn narrate(&self, rubric: &str, input: &str) -> Option<String> {
        let service = self.service.as_ref()?;

        match bounded(self.timeout, "rationale", service.complete(rubric, input)).await {
            Ok(text) => Some(text.trim().to_string()),
            Err(err) => {
                warn!(%err, "rationale call failed, using templated fallback");
                None
            }
        }
    }
}

/// Parse a reply that must be a single JSON object, tolerating the
/// common markdown code-fence wrapping.
fn parse_strict_json<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = strip_fences(raw.trim());
    Ok(serde_json::from_str(trimmed)?)
}

fn strip_fences(raw: &str) -> &str {
    raw.strip_prefix("```json")
        .or_else(|| raw.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::MockScoring;
    use emberlend_common::EmberlendError;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        score: u16,
    }

    fn adapter_with(mock: MockScoring) -> ScoreAdapter {
        ScoreAdapter::new(Some(Arc::new(mock)), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_unconfigured_adapter_returns_none() {
        let adapter = ScoreAdapter::disabled();
        let out: Option<Reply> = adapter.try_score("tradfi", "rubric", &json!({})).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_strict_json_reply() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Ok(r#"{"score": 742}"#.to_string()));

        let out: Option<Reply> = adapter_with(mock).try_score("tradfi", "rubric", &json!({})).await;
        assert_eq!(out, Some(Reply { score: 742 }));
    }

    #[tokio::test]
    async fn test_fenced_reply_is_unwrapped() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Ok("```json\n{\"score\": 13}\n```".to_string()));

        let out: Option<Reply> = adapter_with(mock).try_score("risk", "rubric", &json!({})).await;
        assert_eq!(out, Some(Reply { score: 13 }));
    }

    #[tokio::test]
    async fn test_malformed_reply_falls_back() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Ok("I think the score should be around 700".to_string()));

        let out: Option<Reply> = adapter_with(mock).try_score("tradfi", "rubric", &json!({})).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_service_error_falls_back() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Err(EmberlendError::ScoringService("backend down".into())));

        let out: Option<Reply> = adapter_with(mock).try_score("onchain", "rubric", &json!({})).await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_narrate_trims_reply() {
        let mut mock = MockScoring::new();
        mock.expect_complete()
            .returning(|_, _| Ok("  Loan approved on solid footing.\n".to_string()));

        let out = adapter_with(mock).narrate("rubric", "input").await;
        assert_eq!(out.as_deref(), Some("Loan approved on solid footing."));
    }
}
