//! Run state machine and the strongly-typed run aggregate.
//!
//! States advance in one direction only; `Failed` is reachable from any
//! non-terminal state and preserves everything produced so far.

use std::path::PathBuf;
use std::time::Duration;

use docsift_chunk::LoadStats;
use docsift_core::error::DocsiftError;
use docsift_core::types::{Answer, Chunk, Evidence, Summary};

/// Pipeline position. One stage moves the run from each state to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Chunked,
    Scanned,
    Selected,
    Extracted,
    Synthesized,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// The state a successful transition advances to, if any.
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            PipelineState::Init => Some(PipelineState::Chunked),
            PipelineState::Chunked => Some(PipelineState::Scanned),
            PipelineState::Scanned => Some(PipelineState::Selected),
            PipelineState::Selected => Some(PipelineState::Extracted),
            PipelineState::Extracted => Some(PipelineState::Synthesized),
            PipelineState::Synthesized => Some(PipelineState::Done),
            PipelineState::Done | PipelineState::Failed => None,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineState::Init => "init",
            PipelineState::Chunked => "chunked",
            PipelineState::Scanned => "scanned",
            PipelineState::Selected => "selected",
            PipelineState::Extracted => "extracted",
            PipelineState::Synthesized => "synthesized",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// The stage executing a transition. Used for timing keys and failure
/// reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Chunk,
    Scan,
    Select,
    Extract,
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 5] =
        [Stage::Chunk, Stage::Scan, Stage::Select, Stage::Extract, Stage::Synthesize];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Chunk => "chunk",
            Stage::Scan => "scan",
            Stage::Select => "select",
            Stage::Extract => "extract",
            Stage::Synthesize => "synthesize",
        };
        write!(f, "{name}")
    }
}

/// Per-stage wall-clock durations, in execution order.
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    entries: Vec<(Stage, Duration)>,
}

impl StageTimings {
    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.entries.push((stage, elapsed));
    }

    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.entries.iter().find(|(s, _)| *s == stage).map(|(_, d)| *d)
    }

    pub fn total(&self) -> Duration {
        self.entries.iter().map(|(_, d)| *d).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Stage, Duration)> {
        self.entries.iter()
    }
}

/// Why and where a run ended in `Failed`.
#[derive(Debug)]
pub struct RunFailure {
    pub stage: Stage,
    pub cause: DocsiftError,
}

/// Everything a run produces, stage by stage. Each field is written exactly
/// once, by the stage that owns it; on failure the fields written so far are
/// preserved for diagnostics.
#[derive(Debug)]
pub struct RunState {
    pub question: String,
    pub directory: PathBuf,
    pub state: PipelineState,

    // Chunk stage.
    pub load_stats: Option<LoadStats>,
    pub chunks: Vec<Chunk>,

    // Scan stage.
    pub summaries: Vec<Summary>,
    /// Chunk ids whose scan exhausted its retries.
    pub scan_failures: Vec<String>,

    // Select stage.
    pub selection: Vec<String>,
    pub selection_fallback_used: bool,

    // Extract stage.
    pub evidence: Vec<Evidence>,
    /// Selected chunks that yielded no evidence (valid, not an error).
    pub extract_no_yield: usize,
    /// Chunk ids whose extraction exhausted its retries.
    pub extract_failures: Vec<String>,

    // Synthesize stage.
    pub answer: Option<Answer>,

    pub timings: StageTimings,
    pub failure: Option<RunFailure>,
}

impl RunState {
    pub fn new(question: &str, directory: &std::path::Path) -> Self {
        Self {
            question: question.to_string(),
            directory: directory.to_path_buf(),
            state: PipelineState::Init,
            load_stats: None,
            chunks: Vec::new(),
            summaries: Vec::new(),
            scan_failures: Vec::new(),
            selection: Vec::new(),
            selection_fallback_used: false,
            evidence: Vec::new(),
            extract_no_yield: 0,
            extract_failures: Vec::new(),
            answer: None,
            timings: StageTimings::default(),
            failure: None,
        }
    }

    /// Total degraded items (scan + extract skips), for user-facing reporting.
    pub fn skipped_items(&self) -> usize {
        self.scan_failures.len() + self.extract_failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_advance_in_one_direction() {
        let mut state = PipelineState::Init;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(state, PipelineState::Done);
        assert_eq!(seen.len(), 7);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_terminal_states_have_no_successor() {
        assert!(PipelineState::Done.next().is_none());
        assert!(PipelineState::Failed.next().is_none());
        assert!(PipelineState::Failed.is_terminal());
        assert!(!PipelineState::Scanned.is_terminal());
    }

    #[test]
    fn test_timings_preserve_order_and_sum() {
        let mut timings = StageTimings::default();
        timings.record(Stage::Chunk, Duration::from_millis(5));
        timings.record(Stage::Scan, Duration::from_millis(20));
        assert_eq!(timings.get(Stage::Chunk), Some(Duration::from_millis(5)));
        assert_eq!(timings.get(Stage::Select), None);
        assert_eq!(timings.total(), Duration::from_millis(25));
        let stages: Vec<Stage> = timings.iter().map(|(s, _)| *s).collect();
        assert_eq!(stages, vec![Stage::Chunk, Stage::Scan]);
    }

    #[test]
    fn test_new_run_state_is_init() {
        let run = RunState::new("q?", std::path::Path::new("/tmp/docs"));
        assert_eq!(run.state, PipelineState::Init);
        assert!(run.chunks.is_empty());
        assert!(run.failure.is_none());
        assert_eq!(run.skipped_items(), 0);
    }
}
