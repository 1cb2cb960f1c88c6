//! Trait seam between the pipeline and the inference backend.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::Tier;

/// A text-generation backend addressed by service tier.
///
/// Implementations resolve the tier to a concrete model alias and perform a
/// single request; retry policy lives above this trait.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send `prompt` to the model behind `tier` and return the raw text.
    async fn invoke(&self, tier: Tier, prompt: &str) -> Result<String>;
}
