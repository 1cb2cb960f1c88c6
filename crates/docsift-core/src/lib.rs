//! # Docsift Core
//!
//! Shared foundation for the docsift workspace: the immutable run
//! configuration, the error taxonomy, the data model (documents, chunks,
//! summaries, evidence, answers), and the `InferenceClient` trait that the
//! provider crate implements and the pipeline consumes.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::DocsiftConfig;
pub use error::{DocsiftError, Result};
pub use traits::InferenceClient;
pub use types::{Answer, Chunk, Document, Evidence, Summary, Tier};
