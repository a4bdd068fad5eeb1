//! HTTP client for the intelligent scoring backend
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. The backend
//! is optional; construction returns `None` when no endpoint is
//! configured and the engine then runs entirely on its rule-based
//! formulas.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use emberlend_common::{EmberlendError, Result};
use emberlend_engine::ScoringService;

use crate::config::ScoringSettings;

pub struct HttpScoringService {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl HttpScoringService {
    /// Build a client from settings; `None` when no endpoint is set.
    pub fn from_settings(settings: &ScoringSettings) -> Option<Self> {
        let endpoint = settings.endpoint.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl ScoringService for HttpScoringService {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": 0.2,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| EmberlendError::ScoringService(format!("request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmberlendError::ScoringService(format!(
                "backend returned {status}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| EmberlendError::ScoringService(format!("malformed response: {err}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| EmberlendError::ScoringService("empty choices".into()))?;

        debug!(model = %self.model, "scoring backend replied");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_endpoint_means_no_client() {
        let settings = ScoringSettings::default();
        assert!(HttpScoringService::from_settings(&settings).is_none());
    }

    #[test]
    fn test_endpoint_builds_client() {
        let settings = ScoringSettings {
            endpoint: Some("http://localhost:9999/v1/chat/completions".into()),
            api_key: None,
            model: "test-model".into(),
        };
        assert!(HttpScoringService::from_settings(&settings).is_some());
    }
}
