//! # Docsift Pipeline
//!
//! The staged pipeline that narrows a folder of documents down to one cited
//! answer:
//!
//! ```text
//! chunk → scan (fast tier, parallel)
//!       → select (mid tier, single call)
//!       → extract (high tier, parallel over selected chunks only)
//!       → synthesize (high tier, single call)
//! ```
//!
//! The [`PipelineController`] drives an explicit state machine over these
//! stages: per-chunk failures degrade the run, single-call failures end it,
//! and cancellation is honored at every stage boundary.

pub mod controller;
pub mod prompts;
pub mod stages;
pub mod state;

pub use controller::{CancelFlag, PipelineController};
pub use state::{PipelineState, RunFailure, RunState, Stage, StageTimings};
