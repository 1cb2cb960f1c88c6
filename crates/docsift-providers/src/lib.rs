//! # Docsift Providers
//!
//! Inference backend implementations. A single `OpenAiCompatibleClient`
//! covers every `/chat/completions` server (Ollama, llama.cpp, OpenAI,
//! OpenRouter, ...) — tiers differ only in which model alias they resolve
//! to. The `RetryingClient` wrapper adds bounded retry with backoff for
//! transient failures.

pub mod openai_compatible;
pub mod retry;

pub use openai_compatible::OpenAiCompatibleClient;
pub use retry::{RetryPolicy, RetryingClient};

use std::sync::Arc;

use docsift_core::config::DocsiftConfig;
use docsift_core::error::Result;
use docsift_core::traits::InferenceClient;

/// Build the inference client from configuration: HTTP transport plus the
/// retry layer the pipeline expects.
pub fn create_client(config: &DocsiftConfig) -> Result<Arc<dyn InferenceClient>> {
    let inner = OpenAiCompatibleClient::new(&config.models)?;
    let policy = RetryPolicy::new(config.runtime.max_retries, config.runtime.retry_backoff_ms);
    Ok(Arc::new(RetryingClient::new(Box::new(inner), policy)))
}
