//! Data model for a docsift run.
//!
//! Everything here is immutable once produced: a stage constructs its output
//! and hands it forward, it never rewrites an earlier stage's data.

use serde::{Deserialize, Serialize};

/// Inference service tier. Selects which model alias handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    /// Cheap mass work — per-chunk scanning.
    Fast,
    /// Mid-cost reasoning — chunk selection.
    Mid,
    /// High-quality — extraction and final synthesis.
    High,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Fast => write!(f, "fast"),
            Tier::Mid => write!(f, "mid"),
            Tier::High => write!(f, "high"),
        }
    }
}

/// A loaded source document. `id` is the file name within the queried
/// directory.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub text: String,
}

/// A bounded-size segment of one document.
///
/// `text` is the overlap prefix (context copied from the previous chunk)
/// followed by the core region. Only the core region participates in
/// document reconstruction; `char_start..char_end` are core coordinates in
/// characters within the source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable id, `"<document_id>_s<N>"` with N starting at 1.
    pub id: String,
    pub document_id: String,
    /// Zero-based position among the document's chunks.
    pub sequence_index: usize,
    /// Overlap prefix + core text.
    pub text: String,
    /// Core start, in characters, within the source document.
    pub char_start: usize,
    /// Core end (exclusive), in characters, within the source document.
    pub char_end: usize,
    /// Byte offset into `text` where the core region begins.
    pub core_offset: usize,
}

impl Chunk {
    /// The non-overlap core region. Concatenating cores in sequence order
    /// reconstructs the source document exactly.
    pub fn core_text(&self) -> &str {
        &self.text[self.core_offset..]
    }

    /// Core length in characters (the length bounded by `target_size`).
    pub fn core_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// One-sentence summary of a chunk, produced by the fast tier.
#[derive(Debug, Clone)]
pub struct Summary {
    pub chunk_id: String,
    pub text: String,
}

/// An excerpt extracted from a selected chunk by the high tier.
#[derive(Debug, Clone)]
pub struct Evidence {
    pub chunk_id: String,
    pub excerpt: String,
}

/// The final synthesized answer with inline `[chunk_id : snippet]`
/// citations.
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::Fast.to_string(), "fast");
        assert_eq!(Tier::Mid.to_string(), "mid");
        assert_eq!(Tier::High.to_string(), "high");
    }

    #[test]
    fn test_chunk_core_text() {
        let chunk = Chunk {
            id: "doc.md_s2".into(),
            document_id: "doc.md".into(),
            sequence_index: 1,
            text: "tail of previous. the actual core".into(),
            char_start: 100,
            char_end: 115,
            core_offset: 18,
        };
        assert_eq!(chunk.core_text(), "the actual core");
        assert_eq!(chunk.core_len(), 15);
    }
}
