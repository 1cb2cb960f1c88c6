//! Pipeline controller — drives the run state machine.
//!
//! Each transition invokes exactly one stage, times it, and either advances
//! the state or moves the run to `Failed` with the stage name and cause.
//! Cancellation is cooperative and checked only at stage boundaries;
//! in-flight requests for the current stage are allowed to finish.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use docsift_chunk::{Chunker, DocumentLoader};
use docsift_core::config::DocsiftConfig;
use docsift_core::error::DocsiftError;
use docsift_core::traits::InferenceClient;

use crate::stages;
use crate::state::{PipelineState, RunFailure, RunState, Stage};

/// Cooperative cancellation handle. Cloneable; any clone can request
/// cancellation, observed by the controller at the next stage boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Owns one run at a time: loads, chunks, and walks the stage sequence.
pub struct PipelineController {
    config: DocsiftConfig,
    client: Arc<dyn InferenceClient>,
    cancel: CancelFlag,
}

impl PipelineController {
    pub fn new(config: DocsiftConfig, client: Arc<dyn InferenceClient>) -> Self {
        Self { config, client, cancel: CancelFlag::new() }
    }

    /// Handle for requesting cancellation from outside the run.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Execute a full run. Always returns the run state — on failure it
    /// carries everything produced up to the failing stage.
    pub async fn run(&self, question: &str, directory: &Path) -> RunState {
        let mut run = RunState::new(question, directory);

        // ── Chunk: Init → Chunked ──────────────────────────
        if self.cancelled(&mut run, Stage::Chunk) {
            return run;
        }
        let started = Instant::now();
        let loader = DocumentLoader::new(&self.config.loader);
        let (documents, stats) = match loader.load_dir(directory) {
            Ok(loaded) => loaded,
            Err(e) => {
                self.fail(&mut run, Stage::Chunk, e);
                return run;
            }
        };
        run.load_stats = Some(stats);
        if documents.is_empty() {
            let cause = DocsiftError::NoInputDocuments(directory.display().to_string());
            self.fail(&mut run, Stage::Chunk, cause);
            return run;
        }
        let chunker = Chunker::new(&self.config.chunking);
        run.chunks = chunker.chunk_documents(&documents);
        run.timings.record(Stage::Chunk, started.elapsed());
        run.state = PipelineState::Chunked;
        tracing::info!(
            "chunked {} document(s) into {} chunk(s)",
            documents.len(),
            run.chunks.len()
        );

        // ── Scan: Chunked → Scanned ────────────────────────
        if self.cancelled(&mut run, Stage::Scan) {
            return run;
        }
        let started = Instant::now();
        let outcome = stages::scan::run(&self.client, &self.config.runtime, &run.chunks).await;
        run.summaries = outcome.summaries;
        run.scan_failures = outcome.failed;
        run.timings.record(Stage::Scan, started.elapsed());
        run.state = PipelineState::Scanned;
        tracing::info!(
            "scanned {} chunk(s), {} failed",
            run.summaries.len(),
            run.scan_failures.len()
        );

        // ── Select: Scanned → Selected ─────────────────────
        if self.cancelled(&mut run, Stage::Select) {
            return run;
        }
        let started = Instant::now();
        if run.summaries.is_empty() {
            // Every scan failed; there is nothing to select from. Degrade to
            // an empty selection and let synthesis say so.
            tracing::warn!("no chunk produced a summary; proceeding with an empty selection");
            run.selection_fallback_used = true;
        } else {
            match stages::select::run(
                &self.client,
                &run.question,
                &run.summaries,
                &run.scan_failures,
                self.config.runtime.selection_max,
            )
            .await
            {
                Ok(outcome) => {
                    run.selection = outcome.selection;
                    run.selection_fallback_used = outcome.fallback_used;
                }
                Err(e) => {
                    self.fail(&mut run, Stage::Select, e);
                    return run;
                }
            }
        }
        run.timings.record(Stage::Select, started.elapsed());
        run.state = PipelineState::Selected;
        tracing::info!("selected {} chunk(s)", run.selection.len());

        // ── Extract: Selected → Extracted ──────────────────
        if self.cancelled(&mut run, Stage::Extract) {
            return run;
        }
        let started = Instant::now();
        let outcome = stages::extract::run(
            &self.client,
            &self.config.runtime,
            &run.question,
            &run.chunks,
            &run.selection,
        )
        .await;
        run.evidence = outcome.evidence;
        run.extract_no_yield = outcome.no_yield;
        run.extract_failures = outcome.failed;
        run.timings.record(Stage::Extract, started.elapsed());
        run.state = PipelineState::Extracted;
        tracing::info!(
            "extracted {} evidence excerpt(s), {} chunk(s) yielded nothing",
            run.evidence.len(),
            run.extract_no_yield
        );

        // ── Synthesize: Extracted → Synthesized ────────────
        if self.cancelled(&mut run, Stage::Synthesize) {
            return run;
        }
        let started = Instant::now();
        match stages::synthesize::run(&self.client, &run.question, &run.evidence).await {
            Ok(answer) => run.answer = Some(answer),
            Err(e) => {
                self.fail(&mut run, Stage::Synthesize, e);
                return run;
            }
        }
        run.timings.record(Stage::Synthesize, started.elapsed());
        run.state = PipelineState::Synthesized;

        run.state = PipelineState::Done;
        run
    }

    fn cancelled(&self, run: &mut RunState, stage: Stage) -> bool {
        if self.cancel.is_requested() {
            self.fail(run, stage, DocsiftError::Cancelled(stage.to_string()));
            true
        } else {
            false
        }
    }

    fn fail(&self, run: &mut RunState, stage: Stage, cause: DocsiftError) {
        tracing::error!("run failed at {} stage: {}", stage, cause);
        run.failure = Some(RunFailure { stage, cause });
        run.state = PipelineState::Failed;
    }
}
