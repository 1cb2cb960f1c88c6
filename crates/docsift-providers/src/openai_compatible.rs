//! Unified OpenAI-compatible inference client.
//!
//! One struct handles chat completions for any OpenAI-compatible API.
//! Tiers are distinguished only by the model alias they resolve to; the
//! endpoint, auth, and wire format are shared. Local servers (Ollama,
//! llama.cpp) need no API key.

use async_trait::async_trait;
use serde_json::{Value, json};

use docsift_core::config::ModelsConfig;
use docsift_core::error::{DocsiftError, Result};
use docsift_core::traits::InferenceClient;
use docsift_core::types::Tier;

/// A client for any `/chat/completions` server.
pub struct OpenAiCompatibleClient {
    /// Base URL for the API (e.g., "http://localhost:11434/v1").
    base_url: String,
    /// Bearer key; empty for unauthenticated local servers.
    api_key: String,
    /// Model alias per tier.
    fast: String,
    mid: String,
    high: String,
    temperature: f32,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(config: &ModelsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DocsiftError::Http(format!("failed to build http client: {e}")))?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            fast: config.fast.clone(),
            mid: config.mid.clone(),
            high: config.high.clone(),
            temperature: config.temperature,
            timeout_secs: config.request_timeout_secs,
            client,
        })
    }

    /// Resolve a tier to its configured model alias.
    pub fn model_for(&self, tier: Tier) -> &str {
        match tier {
            Tier::Fast => &self.fast,
            Tier::Mid => &self.mid,
            Tier::High => &self.high,
        }
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }
}

#[async_trait]
impl InferenceClient for OpenAiCompatibleClient {
    async fn invoke(&self, tier: Tier, prompt: &str) -> Result<String> {
        let model = self.model_for(tier);
        let body = json!({
            "model": model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                DocsiftError::Timeout(self.timeout_secs)
            } else {
                DocsiftError::Http(format!("{tier} tier connection failed ({url}): {e}"))
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(DocsiftError::Api { status, message: text });
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| DocsiftError::Http(format!("failed to read response body: {e}")))?;
        parse_chat_content(&payload)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
pub fn parse_chat_content(payload: &Value) -> Result<String> {
    let choice = payload["choices"]
        .get(0)
        .ok_or_else(|| DocsiftError::Validation("no choices in response".into()))?;
    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DocsiftError::Validation("response choice has no text content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::config::ModelsConfig;

    #[test]
    fn test_tier_alias_resolution() {
        let mut config = ModelsConfig::default();
        config.fast = "tiny".into();
        config.mid = "medium".into();
        config.high = "large".into();
        let client = OpenAiCompatibleClient::new(&config).unwrap();

        assert_eq!(client.model_for(Tier::Fast), "tiny");
        assert_eq!(client.model_for(Tier::Mid), "medium");
        assert_eq!(client.model_for(Tier::High), "large");
    }

    #[test]
    fn test_trailing_slash_stripped() {
        let mut config = ModelsConfig::default();
        config.endpoint = "http://localhost:11434/v1/".into();
        let client = OpenAiCompatibleClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_parse_chat_content() {
        let payload = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "hello" } }]
        });
        assert_eq!(parse_chat_content(&payload).unwrap(), "hello");
    }

    #[test]
    fn test_parse_rejects_empty_choices() {
        let payload = serde_json::json!({ "choices": [] });
        assert!(matches!(
            parse_chat_content(&payload),
            Err(DocsiftError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_rejects_missing_content() {
        let payload = serde_json::json!({
            "choices": [{ "message": { "role": "assistant" } }]
        });
        assert!(parse_chat_content(&payload).is_err());
    }
}
