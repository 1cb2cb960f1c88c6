//! Synthesize stage — one high-tier call drafts the final cited answer.
//!
//! Citation checking is advisory: an id cited outside the evidence set is a
//! quality warning, never a failure, because citations are not verifiable
//! beyond id membership.

use std::collections::HashSet;
use std::sync::Arc;

use docsift_core::error::Result;
use docsift_core::traits::InferenceClient;
use docsift_core::types::{Answer, Evidence, Tier};

use crate::prompts;

pub async fn run(
    client: &Arc<dyn InferenceClient>,
    question: &str,
    evidence: &[Evidence],
) -> Result<Answer> {
    let block = if evidence.is_empty() {
        "No relevant information could be extracted from the documents.".to_string()
    } else {
        evidence
            .iter()
            .map(|e| format!("--- Source: {} ---\n{}", e.chunk_id, e.excerpt))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let prompt = format!(
        "{}\n\n{}",
        prompts::PERSONA,
        prompts::synthesize_prompt(question, &block)
    );
    let text = client.invoke(Tier::High, &prompt).await?.trim().to_string();

    for id in unknown_citations(&text, evidence) {
        tracing::warn!("answer cites '{}' which is not in the evidence set", id);
    }

    Ok(Answer { text })
}

/// Chunk ids cited in `text` that do not belong to the evidence set.
pub fn unknown_citations(text: &str, evidence: &[Evidence]) -> Vec<String> {
    let known: HashSet<&str> = evidence.iter().map(|e| e.chunk_id.as_str()).collect();
    cited_ids(text)
        .into_iter()
        .filter(|id| !known.contains(id.as_str()))
        .collect()
}

/// Citation tokens in the answer: `[chunk_id : snippet]` or `[chunk_id]`.
/// Only bracketed tokens shaped like a chunk id count — the model is free
/// to use brackets for anything else.
pub fn cited_ids(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for (pos, _) in text.match_indices('[') {
        let rest = &text[pos + 1..];
        let end = rest.find([':', ']']).unwrap_or(rest.len());
        let candidate = rest[..end].trim();
        if looks_like_chunk_id(candidate) && !out.iter().any(|seen| seen == candidate) {
            out.push(candidate.to_string());
        }
    }
    out
}

fn looks_like_chunk_id(s: &str) -> bool {
    if s.is_empty() || s.contains('\n') {
        return false;
    }
    match s.rsplit_once("_s") {
        Some((doc, seq)) => {
            !doc.is_empty() && !seq.is_empty() && seq.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}
