//! Extract stage — a high-tier deep read of each *selected* chunk.
//!
//! Unselected chunks are never touched here; that narrowing is the whole
//! point of the pipeline. Concurrency and failure policy mirror the scan
//! stage. A chunk that honestly reports nothing relevant contributes zero
//! evidence — valid, not an error.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;

use docsift_core::config::RuntimeConfig;
use docsift_core::error::Result;
use docsift_core::traits::InferenceClient;
use docsift_core::types::{Chunk, Evidence, Tier};

use crate::prompts;

/// Sentinel the extractor prompt asks for when a chunk has nothing relevant.
const NOTHING_SENTINEL: &str = "NOTHING";

/// Responses shorter than this are treated as a no-yield, not evidence.
const MIN_EXCERPT_CHARS: usize = 10;

pub struct ExtractOutcome {
    /// Evidence in selection order.
    pub evidence: Vec<Evidence>,
    /// Selected chunks that answered with the no-relevance sentinel.
    pub no_yield: usize,
    /// Chunk ids whose extraction exhausted its retries.
    pub failed: Vec<String>,
}

pub async fn run(
    client: &Arc<dyn InferenceClient>,
    runtime: &RuntimeConfig,
    question: &str,
    chunks: &[Chunk],
    selection: &[String],
) -> ExtractOutcome {
    let by_id: HashMap<&str, &Chunk> = chunks.iter().map(|c| (c.id.as_str(), c)).collect();
    let selected: Vec<&Chunk> = selection
        .iter()
        .filter_map(|id| by_id.get(id.as_str()).copied())
        .collect();

    let results: Vec<(String, Result<Option<String>>)> =
        futures::stream::iter(selected.iter().map(|chunk| {
            let client = Arc::clone(client);
            let id = chunk.id.clone();
            let prompt = prompts::extract_prompt(question, &chunk.id, &chunk.text);
            async move {
                let result = client
                    .invoke(Tier::High, &prompt)
                    .await
                    .map(|raw| excerpt_from(&raw));
                (id, result)
            }
        }))
        .buffer_unordered(runtime.extract_concurrency)
        .collect()
        .await;

    let mut results: HashMap<String, Result<Option<String>>> = results.into_iter().collect();

    let mut evidence = Vec::new();
    let mut no_yield = 0usize;
    let mut failed = Vec::new();
    for chunk in &selected {
        match results.remove(chunk.id.as_str()) {
            Some(Ok(Some(excerpt))) => {
                evidence.push(Evidence { chunk_id: chunk.id.clone(), excerpt })
            }
            Some(Ok(None)) => {
                tracing::debug!("nothing relevant in {}", chunk.id);
                no_yield += 1;
            }
            Some(Err(e)) => {
                tracing::warn!("extract failed for {}: {} — continuing without it", chunk.id, e);
                failed.push(chunk.id.clone());
            }
            None => failed.push(chunk.id.clone()),
        }
    }
    ExtractOutcome { evidence, no_yield, failed }
}

/// Turn a raw extractor response into an excerpt, or `None` for the
/// sentinel / degenerate answers.
fn excerpt_from(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.to_uppercase().contains(NOTHING_SENTINEL)
        || trimmed.chars().count() < MIN_EXCERPT_CHARS
    {
        None
    } else {
        Some(trimmed.to_string())
    }
}
