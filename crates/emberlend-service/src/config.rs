//! Service configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Emberlend service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Initial lending-pool liquidity in whole tokens
    pub pool_tokens: u64,
    /// Scoring backend configuration
    pub scoring: ScoringSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            pool_tokens: 100_000,
            scoring: ScoringSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let mut cfg = Self::default();

        // Platform PORT variable takes priority
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }

        if let Ok(host) = std::env::var("EMBERLEND_HOST") {
            cfg.host = host;
        }
        if let Ok(port) = std::env::var("EMBERLEND_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                cfg.port = p;
            }
        }
        if let Ok(val) = std::env::var("EMBERLEND_POOL_TOKENS") {
            if let Ok(v) = val.parse() {
                cfg.pool_tokens = v;
            }
        }

        // Scoring settings
        if let Ok(endpoint) = std::env::var("EMBERLEND_SCORING_ENDPOINT") {
            cfg.scoring.endpoint = Some(endpoint);
        }
        if let Ok(key) = std::env::var("EMBERLEND_SCORING_API_KEY") {
            cfg.scoring.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("EMBERLEND_SCORING_MODEL") {
            cfg.scoring.model = model;
        }

        Ok(cfg)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Intelligent scoring backend settings. The backend is optional; with
/// no endpoint configured every scoring stage uses its rule-based
/// formula.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    /// Chat-completions endpoint URL
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint
    pub api_key: Option<String>,
    /// Model identifier sent with each request
    pub model: String,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.port, 8090);
        assert_eq!(cfg.pool_tokens, 100_000);
        assert!(cfg.scoring.endpoint.is_none());
    }

    #[test]
    fn test_bind_address() {
        let cfg = ServiceConfig::default();
        assert_eq!(cfg.bind_address(), "0.0.0.0:8090");
    }
}
