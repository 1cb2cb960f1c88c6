//! Bounded retry with exponential backoff.
//!
//! Only transient errors (timeouts, connection failures, overload statuses)
//! are retried; malformed output and client errors surface immediately.
//! What an exhausted retry means — skip the chunk or fail the run — is the
//! caller's policy, not this layer's.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use docsift_core::error::Result;
use docsift_core::traits::InferenceClient;
use docsift_core::types::Tier;

/// Retry budget for a single logical call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first, transient errors only.
    pub max_retries: u32,
    /// Base delay; doubles on every retry.
    pub backoff_ms: u64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_ms: u64) -> Self {
        Self { max_retries, backoff_ms }
    }

    /// Run `attempt` until it succeeds, fails permanently, or the budget is
    /// spent.
    pub async fn run<T, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut tries = 0u32;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && tries < self.max_retries => {
                    tries += 1;
                    let delay = self.backoff_ms.saturating_mul(1u64 << (tries - 1).min(16));
                    tracing::warn!(
                        "{label}: transient failure (attempt {tries}/{}): {e}; retrying in {delay}ms",
                        self.max_retries
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// An `InferenceClient` that retries its inner client per policy.
pub struct RetryingClient {
    inner: Box<dyn InferenceClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Box<dyn InferenceClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl InferenceClient for RetryingClient {
    async fn invoke(&self, tier: Tier, prompt: &str) -> Result<String> {
        let label = format!("{tier} tier");
        self.policy
            .run(&label, || self.inner.invoke(tier, prompt))
            .await
    }
}
