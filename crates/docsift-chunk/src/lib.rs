//! # Docsift Chunk
//!
//! Everything that happens before the first model call: loading documents
//! from a directory and splitting them into bounded, reconstructable chunks.
//! No inference, no I/O beyond reading files — the chunker itself is a pure
//! function of (text, config).

pub mod chunker;
pub mod loader;

pub use chunker::Chunker;
pub use loader::{DocumentLoader, FileDetail, LoadStats};
