//! Scan stage — one fast-tier summary per chunk.
//!
//! Chunks are scanned concurrently up to the configured ceiling. A chunk
//! whose call fails (after the client's retries) is recorded and skipped;
//! the stage itself never fails. Results are re-ordered to document order
//! before selection so the selector prompt is reproducible regardless of
//! completion timing.

use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt;

use docsift_core::config::RuntimeConfig;
use docsift_core::error::Result;
use docsift_core::traits::InferenceClient;
use docsift_core::types::{Chunk, Summary, Tier};

use crate::prompts;
use crate::stages::char_prefix;

pub struct ScanOutcome {
    /// Summaries in document order.
    pub summaries: Vec<Summary>,
    /// Chunk ids whose scan exhausted its retries.
    pub failed: Vec<String>,
}

pub async fn run(
    client: &Arc<dyn InferenceClient>,
    runtime: &RuntimeConfig,
    chunks: &[Chunk],
) -> ScanOutcome {
    let results: Vec<(String, Result<String>)> = futures::stream::iter(chunks.iter().map(|chunk| {
        let client = Arc::clone(client);
        let id = chunk.id.clone();
        let prompt = prompts::scan_prompt(char_prefix(&chunk.text, runtime.scan_preview_chars));
        let clamp = runtime.summary_max_chars;
        async move {
            let result = client
                .invoke(Tier::Fast, &prompt)
                .await
                .map(|raw| flatten_summary(&raw, clamp));
            (id, result)
        }
    }))
    .buffer_unordered(runtime.scan_concurrency)
    .collect()
    .await;

    let mut by_id: HashMap<String, Result<String>> = results.into_iter().collect();

    // Keyed writes above, deterministic merge here: document order wins over
    // completion order.
    let mut summaries = Vec::new();
    let mut failed = Vec::new();
    for chunk in chunks {
        match by_id.remove(&chunk.id) {
            Some(Ok(text)) => summaries.push(Summary { chunk_id: chunk.id.clone(), text }),
            Some(Err(e)) => {
                tracing::warn!("scan failed for {}: {} — continuing without it", chunk.id, e);
                failed.push(chunk.id.clone());
            }
            None => failed.push(chunk.id.clone()),
        }
    }
    ScanOutcome { summaries, failed }
}

/// Summaries go into a one-line-per-chunk prompt: flatten newlines and clamp.
fn flatten_summary(raw: &str, max_chars: usize) -> String {
    let flat = raw.trim().replace('\n', " ");
    char_prefix(&flat, max_chars).to_string()
}
