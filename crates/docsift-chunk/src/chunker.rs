//! Deterministic chunker.
//!
//! Splits a document into bounded-size chunks using a hierarchical separator
//! cascade, then re-packs, merges undersized pieces, and prefixes overlap
//! context. All sizes are measured in characters. The core regions of the
//! produced chunks partition the document text exactly — concatenating them
//! in order reconstructs the input byte for byte.

use std::ops::Range;

use docsift_core::config::ChunkingConfig;
use docsift_core::types::{Chunk, Document};

/// Split separators, coarsest to finest. The space separator is the terminal
/// fallback; a span without any whitespace falls through to fixed-width
/// slicing.
const SEPARATORS: [&str; 6] = ["\n\n\n", "\n\n", "\n", ". ", ", ", " "];

/// Pure, deterministic document → chunks function.
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self { config: config.clone() }
    }

    /// Chunk a single document. Empty input yields an empty sequence.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        if doc.text.is_empty() {
            return Vec::new();
        }

        // 1. Recursive cascade: atomic pieces, each at most target_size chars.
        let mut pieces = Vec::new();
        self.split_span(&doc.text, 0..doc.text.len(), 0, &mut pieces);

        // 2. Greedy packing of adjacent pieces back up to target_size.
        let cores = self.pack(&doc.text, &pieces);

        // 3. Merge undersized chunks into a neighbor (final chunk exempt).
        let cores = self.merge_small(&doc.text, &cores);

        // 4. Overlap prefix + stable ids, in document order.
        self.finalize(doc, &cores)
    }

    /// Chunk every document, preserving document order.
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        docs.iter().flat_map(|d| self.chunk_document(d)).collect()
    }

    /// Recursively split `range` until every emitted piece fits target_size.
    fn split_span(&self, text: &str, range: Range<usize>, level: usize, out: &mut Vec<Range<usize>>) {
        if char_count(&text[range.clone()]) <= self.config.target_size {
            out.push(range);
            return;
        }
        if level >= SEPARATORS.len() {
            // No separator left — fixed-width slicing always terminates.
            self.fixed_width(text, range, out);
            return;
        }
        let parts = split_inclusive_ranges(text, range.clone(), SEPARATORS[level]);
        if parts.len() <= 1 {
            self.split_span(text, range, level + 1, out);
            return;
        }
        for part in parts {
            if char_count(&text[part.clone()]) > self.config.target_size {
                self.split_span(text, part, level + 1, out);
            } else {
                out.push(part);
            }
        }
    }

    /// Last-resort split at exactly target_size characters.
    fn fixed_width(&self, text: &str, range: Range<usize>, out: &mut Vec<Range<usize>>) {
        let mut start = range.start;
        while start < range.end {
            match text[start..range.end].char_indices().nth(self.config.target_size) {
                Some((offset, _)) => {
                    out.push(start..start + offset);
                    start += offset;
                }
                None => {
                    out.push(start..range.end);
                    break;
                }
            }
        }
    }

    /// Pack adjacent pieces greedily without exceeding target_size.
    fn pack(&self, text: &str, pieces: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut cores: Vec<Range<usize>> = Vec::new();
        let mut current: Option<(Range<usize>, usize)> = None;
        for piece in pieces {
            let piece_chars = char_count(&text[piece.clone()]);
            match current.take() {
                Some((range, chars)) if chars + piece_chars <= self.config.target_size => {
                    current = Some((range.start..piece.end, chars + piece_chars));
                }
                Some((range, _)) => {
                    cores.push(range);
                    current = Some((piece.clone(), piece_chars));
                }
                None => {
                    current = Some((piece.clone(), piece_chars));
                }
            }
        }
        if let Some((range, _)) = current {
            cores.push(range);
        }
        cores
    }

    /// Merge cores shorter than min_size into the previous core (or the next
    /// one, for the document head). The final core is exempt.
    fn merge_small(&self, text: &str, cores: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut merged: Vec<Range<usize>> = Vec::new();
        let mut pending_start: Option<usize> = None;
        for (i, core) in cores.iter().enumerate() {
            let start = pending_start.take().unwrap_or(core.start);
            let is_last = i + 1 == cores.len();
            if !is_last && char_count(&text[start..core.end]) < self.config.min_size {
                match merged.last_mut() {
                    Some(prev) => prev.end = core.end,
                    // First core of the document: fold forward instead.
                    None => pending_start = Some(start),
                }
            } else {
                merged.push(start..core.end);
            }
        }
        merged
    }

    /// Assign ids, compute char offsets, and prepend overlap context.
    fn finalize(&self, doc: &Document, cores: &[Range<usize>]) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(cores.len());
        let mut char_pos = 0usize;
        let mut prev_core: Option<&str> = None;
        for (i, range) in cores.iter().enumerate() {
            let core = &doc.text[range.clone()];
            let core_chars = char_count(core);
            let (text, core_offset) = match prev_core {
                Some(prev) if self.config.overlap > 0 => {
                    let tail = char_tail(prev, self.config.overlap);
                    (format!("{tail}{core}"), tail.len())
                }
                _ => (core.to_string(), 0),
            };
            chunks.push(Chunk {
                id: format!("{}_s{}", doc.id, i + 1),
                document_id: doc.id.clone(),
                sequence_index: i,
                text,
                char_start: char_pos,
                char_end: char_pos + core_chars,
                core_offset,
            });
            char_pos += core_chars;
            prev_core = Some(core);
        }
        tracing::debug!("chunked '{}': {} chars → {} chunk(s)", doc.id, char_pos, chunks.len());
        chunks
    }
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// Up to the last `n` characters of `s`.
fn char_tail(s: &str, n: usize) -> &str {
    let count = char_count(s);
    if count <= n {
        return s;
    }
    let (idx, _) = s.char_indices().nth(count - n).unwrap_or((0, ' '));
    &s[idx..]
}

/// Split `range` on `sep`, keeping each separator attached to the end of the
/// piece it terminates, so the pieces partition the range exactly.
fn split_inclusive_ranges(text: &str, range: Range<usize>, sep: &str) -> Vec<Range<usize>> {
    let span = &text[range.clone()];
    let mut out = Vec::new();
    let mut start = 0usize;
    for (pos, _) in span.match_indices(sep) {
        let end = pos + sep.len();
        // match_indices is non-overlapping, so `end` never regresses.
        if end > start {
            out.push(range.start + start..range.start + end);
            start = end;
        }
    }
    if start < span.len() {
        out.push(range.start + start..range.start + span.len());
    }
    out
}
