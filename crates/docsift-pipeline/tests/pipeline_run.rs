//! End-to-end pipeline runs against a scripted mock backend.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use docsift_core::config::DocsiftConfig;
use docsift_core::error::{DocsiftError, Result};
use docsift_core::traits::InferenceClient;
use docsift_core::types::Tier;
use docsift_pipeline::{PipelineController, PipelineState, Stage};

/// Scripted backend: fast-tier summaries, a canned selection response, a
/// canned extraction response, and a cited final answer. Fast-tier calls
/// whose prompt contains `fail_fast_containing` fail permanently, modeling
/// a chunk that exhausts its retries.
struct MockClient {
    select_response: String,
    extract_response: String,
    fail_fast_containing: Option<String>,
    fast_calls: AtomicUsize,
    mid_calls: AtomicUsize,
    high_calls: AtomicUsize,
}

impl MockClient {
    fn new(select_response: &str) -> Self {
        Self {
            select_response: select_response.to_string(),
            extract_response: "Relevant passage: the delivery deadline is March 15.".to_string(),
            fail_fast_containing: None,
            fast_calls: AtomicUsize::new(0),
            mid_calls: AtomicUsize::new(0),
            high_calls: AtomicUsize::new(0),
        }
    }

    fn total_calls(&self) -> usize {
        self.fast_calls.load(Ordering::SeqCst)
            + self.mid_calls.load(Ordering::SeqCst)
            + self.high_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for MockClient {
    async fn invoke(&self, tier: Tier, prompt: &str) -> Result<String> {
        match tier {
            Tier::Fast => {
                self.fast_calls.fetch_add(1, Ordering::SeqCst);
                if let Some(marker) = &self.fail_fast_containing
                    && prompt.contains(marker.as_str())
                {
                    return Err(DocsiftError::Http("connection refused".into()));
                }
                Ok("Notes about the project schedule and deadline.".into())
            }
            Tier::Mid => {
                self.mid_calls.fetch_add(1, Ordering::SeqCst);
                Ok(self.select_response.clone())
            }
            Tier::High => {
                self.high_calls.fetch_add(1, Ordering::SeqCst);
                if prompt.contains("SOURCE:") {
                    Ok(self.extract_response.clone())
                } else {
                    Ok("The deadline is March 15 [a.txt_s1 : \"deadline is March 15\"].".into())
                }
            }
        }
    }
}

fn controller_with(mock: Arc<MockClient>) -> PipelineController {
    let client: Arc<dyn InferenceClient> = mock;
    PipelineController::new(DocsiftConfig::default(), client)
}

fn write_docs(dir: &Path, files: &[(&str, &str)]) {
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
}

#[tokio::test]
async fn test_full_run_reaches_done() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            ("a.txt", "The delivery deadline is March 15, agreed at kickoff."),
            ("b.txt", "Budget notes, unrelated to any schedule discussion."),
        ],
    );

    let mock = Arc::new(MockClient::new(r#"["a.txt_s1"]"#));
    let controller = controller_with(mock.clone());
    let run = controller.run("When is the deadline?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Done);
    assert_eq!(run.chunks.len(), 2);
    assert_eq!(run.summaries.len(), 2);
    assert_eq!(run.selection, vec!["a.txt_s1"]);
    assert!(!run.selection_fallback_used);

    // Evidence containment: every excerpt comes from a selected chunk.
    for ev in &run.evidence {
        assert!(run.selection.contains(&ev.chunk_id));
    }
    assert_eq!(run.evidence.len(), 1);
    assert!(run.answer.as_ref().unwrap().text.contains("March 15"));

    // One fast call per chunk, one mid call, one extract + one synthesis.
    assert_eq!(mock.fast_calls.load(Ordering::SeqCst), 2);
    assert_eq!(mock.mid_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.high_calls.load(Ordering::SeqCst), 2);

    // Every stage recorded a duration.
    for stage in Stage::ALL {
        assert!(run.timings.get(stage).is_some(), "missing timing for {stage}");
    }
}

#[tokio::test]
async fn test_empty_directory_fails_before_any_inference() {
    let dir = tempfile::tempdir().unwrap();

    let mock = Arc::new(MockClient::new("[]"));
    let controller = controller_with(mock.clone());
    let run = controller.run("anything?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Chunk);
    assert!(matches!(failure.cause, DocsiftError::NoInputDocuments(_)));
    assert!(run.chunks.is_empty());
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_unknown_selected_id_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(dir.path(), &[("a.txt", "Some schedule content worth reading.")]);

    let mock = Arc::new(MockClient::new(r#"["ghost.md_s9", "a.txt_s1"]"#));
    let controller = controller_with(mock);
    let run = controller.run("q?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Done);
    assert_eq!(run.selection, vec!["a.txt_s1"]);
}

#[tokio::test]
async fn test_empty_selection_falls_back_to_document_order() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[("a.txt", "First document body."), ("b.txt", "Second document body.")],
    );

    // Only an invented id: validation empties the selection entirely.
    let mock = Arc::new(MockClient::new(r#"["ghost.md_s9"]"#));
    let controller = controller_with(mock);
    let run = controller.run("q?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Done);
    assert!(run.selection_fallback_used);
    assert_eq!(run.selection, vec!["a.txt_s1", "b.txt_s1"]);
}

#[tokio::test]
async fn test_scan_failure_degrades_and_blocks_selection() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(
        dir.path(),
        &[
            ("a.txt", "Good content about the deadline."),
            ("broken.txt", "FAILME this chunk's scan will never succeed."),
        ],
    );

    let mut mock = MockClient::new(r#"["broken.txt_s1", "a.txt_s1"]"#);
    mock.fail_fast_containing = Some("FAILME".into());
    let mock = Arc::new(mock);
    let controller = controller_with(mock);
    let run = controller.run("q?", dir.path()).await;

    // The run still completes; the failed chunk has no summary and cannot
    // be selected even though the selector asked for it.
    assert_eq!(run.state, PipelineState::Done);
    assert_eq!(run.scan_failures, vec!["broken.txt_s1"]);
    assert!(run.summaries.iter().all(|s| s.chunk_id != "broken.txt_s1"));
    assert_eq!(run.selection, vec!["a.txt_s1"]);
    assert_eq!(run.skipped_items(), 1);
    assert!(run.answer.is_some());
}

#[tokio::test]
async fn test_cancellation_checked_at_stage_boundary() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(dir.path(), &[("a.txt", "content")]);

    let mock = Arc::new(MockClient::new("[]"));
    let controller = controller_with(mock.clone());
    controller.cancel_flag().request();
    let run = controller.run("q?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Chunk);
    assert!(matches!(failure.cause, DocsiftError::Cancelled(_)));
    assert_eq!(mock.total_calls(), 0);
}

#[tokio::test]
async fn test_unparseable_selection_is_fatal_but_preserves_state() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(dir.path(), &[("a.txt", "content worth chunking and scanning")]);

    let mock = Arc::new(MockClient::new("I could not decide."));
    let controller = controller_with(mock);
    let run = controller.run("q?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Failed);
    let failure = run.failure.as_ref().unwrap();
    assert_eq!(failure.stage, Stage::Select);
    assert!(matches!(failure.cause, DocsiftError::Validation(_)));

    // Partial state survives for diagnostics.
    assert_eq!(run.chunks.len(), 1);
    assert_eq!(run.summaries.len(), 1);
    assert!(run.answer.is_none());
}

#[tokio::test]
async fn test_no_yield_extraction_still_synthesizes() {
    let dir = tempfile::tempdir().unwrap();
    write_docs(dir.path(), &[("a.txt", "content")]);

    let mut mock = MockClient::new(r#"["a.txt_s1"]"#);
    mock.extract_response = "NOTHING".into();
    let mock = Arc::new(mock);
    let controller = controller_with(mock.clone());
    let run = controller.run("q?", dir.path()).await;

    assert_eq!(run.state, PipelineState::Done);
    assert!(run.evidence.is_empty());
    assert_eq!(run.extract_no_yield, 1);
    // Synthesis still ran (extract + synthesize on the high tier).
    assert_eq!(mock.high_calls.load(Ordering::SeqCst), 2);
    assert!(run.answer.is_some());
}
