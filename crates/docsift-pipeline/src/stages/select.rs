//! Select stage — one mid-tier call narrows all summarized chunks to the
//! few worth a deep read.
//!
//! The model is asked for a JSON array of chunk ids. Ids it invents, and
//! ids belonging to chunks without a summary, are dropped with a warning.
//! An empty validated selection degrades to the first chunks in document
//! order rather than failing the run; a response with no parseable list at
//! all is fatal for this single-shot stage.

use std::collections::HashSet;
use std::sync::Arc;

use docsift_core::error::{DocsiftError, Result};
use docsift_core::traits::InferenceClient;
use docsift_core::types::{Summary, Tier};

use crate::prompts;
use crate::stages::char_prefix;

pub struct SelectOutcome {
    /// Validated, capped chunk ids in the order the model proposed them.
    pub selection: Vec<String>,
    /// True when the empty-selection fallback substituted default chunks.
    pub fallback_used: bool,
}

pub async fn run(
    client: &Arc<dyn InferenceClient>,
    question: &str,
    summaries: &[Summary],
    scan_failed: &[String],
    selection_max: usize,
) -> Result<SelectOutcome> {
    let block: String = summaries
        .iter()
        .map(|s| format!("[{}]: {}\n", s.chunk_id, s.text))
        .collect();
    let prompt = prompts::select_prompt(question, block.trim_end());

    let response = client.invoke(Tier::Mid, &prompt).await?;
    let requested = parse_selection(&response)?;

    let known: HashSet<&str> = summaries.iter().map(|s| s.chunk_id.as_str()).collect();
    let mut selection: Vec<String> = Vec::new();
    for id in requested {
        if selection.contains(&id) {
            continue;
        }
        if known.contains(id.as_str()) {
            selection.push(id);
        } else if scan_failed.contains(&id) {
            tracing::warn!("selector chose '{}' but its scan failed — dropping", id);
        } else {
            tracing::warn!("selector returned unknown chunk id '{}' — dropping", id);
        }
    }

    if selection.len() > selection_max {
        tracing::warn!(
            "selector chose {} chunks, capping at {}",
            selection.len(),
            selection_max
        );
        selection.truncate(selection_max);
    }

    let fallback_used = selection.is_empty();
    if fallback_used {
        selection = summaries
            .iter()
            .take(selection_max)
            .map(|s| s.chunk_id.clone())
            .collect();
        tracing::warn!(
            "selection was empty after validation; degrading to the first {} chunk(s) in document order",
            selection.len()
        );
    }

    Ok(SelectOutcome { selection, fallback_used })
}

/// Parse the model's id list.
///
/// Primary path: the first `[...]` region decoded as a JSON string array.
/// Lenient path: every quoted token in the response (validation above
/// discards strays). No list at all is a hard validation failure.
pub fn parse_selection(response: &str) -> Result<Vec<String>> {
    if let (Some(start), Some(end)) = (response.find('['), response.rfind(']'))
        && start < end
        && let Ok(ids) = serde_json::from_str::<Vec<String>>(&response[start..=end])
    {
        return Ok(ids);
    }

    let quoted: Vec<String> = response
        .split('"')
        .skip(1)
        .step_by(2)
        .map(str::to_string)
        .collect();
    if quoted.is_empty() {
        return Err(DocsiftError::Validation(format!(
            "selector response contains no id list: {}",
            char_prefix(response.trim(), 200)
        )));
    }
    Ok(quoted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_json_array() {
        let ids = parse_selection(r#"["a.md_s1", "b.txt_s3"]"#).unwrap();
        assert_eq!(ids, vec!["a.md_s1", "b.txt_s3"]);
    }

    #[test]
    fn test_parse_array_with_surrounding_prose() {
        let ids = parse_selection("Sure! Here are the chunks:\n[\"doc.md_s2\"]\nHope that helps.")
            .unwrap();
        assert_eq!(ids, vec!["doc.md_s2"]);
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_selection("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_lenient_quoted_tokens() {
        // Broken JSON (trailing comma) falls back to quote scanning.
        let ids = parse_selection(r#"["a.md_s1", "b.md_s2",]"#).unwrap();
        assert_eq!(ids, vec!["a.md_s1", "b.md_s2"]);
    }

    #[test]
    fn test_parse_no_list_is_validation_error() {
        let err = parse_selection("I could not decide which chunks are relevant.");
        assert!(matches!(err, Err(DocsiftError::Validation(_))));
    }
}
