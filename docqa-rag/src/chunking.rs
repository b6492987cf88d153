//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] - prefers paragraph, then sentence, then word boundaries
//! - [`FixedSizeChunker`] - splits by character count only
//!
//! Both measure sizes in characters (Unicode scalar values), never bytes, and
//! share the same window rule: the first chunk starts at the beginning of the
//! document, each following chunk starts exactly `chunk_overlap` characters
//! before the end of its predecessor, and chunking stops as soon as a chunk
//! reaches the end of the document.

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;

    /// Split a batch of documents, preserving document order.
    fn split(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|document| self.chunk(document)).collect()
    }
}

/// Splits text into fixed-size character windows with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// `chunk_overlap` is clamped below `chunk_size` so that every window advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.text.chars().collect();
        let spans = window_spans(&chars, self.chunk_size, self.chunk_overlap, &[]);
        build_chunks(document, &chars, spans)
    }
}

/// Splits text greedily while avoiding severing paragraphs and sentences.
///
/// Every window is at most `chunk_size` characters. Inside a window the cut is
/// placed after the last paragraph break (`\n\n`); failing that, after the
/// last sentence terminator; failing that, after the last whitespace; and only
/// then at the hard ceiling. Cut candidates closer than `chunk_overlap` to the
/// window start are ignored so that every step makes progress.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 20);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// `chunk_overlap` is clamped below `chunk_size` so that every window advances.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self { chunk_size, chunk_overlap: chunk_overlap.min(chunk_size - 1) }
    }
}

/// Break-point separators, strongest first.
const SEPARATOR_LEVELS: &[&[&str]] =
    &[&["\n\n"], &[". ", "! ", "? ", ".\n", "!\n", "?\n"], &[" ", "\n", "\t"]];

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = document.text.chars().collect();
        let spans = window_spans(&chars, self.chunk_size, self.chunk_overlap, SEPARATOR_LEVELS);
        build_chunks(document, &chars, spans)
    }
}

/// Compute `(start, end)` character spans covering `chars`.
///
/// With no separator levels every window is cut at the hard ceiling.
fn window_spans(
    chars: &[char],
    chunk_size: usize,
    chunk_overlap: usize,
    levels: &[&[&str]],
) -> Vec<(usize, usize)> {
    let len = chars.len();
    let mut spans = Vec::new();
    if len == 0 {
        return spans;
    }

    let mut start = 0;
    loop {
        let ceiling = (start + chunk_size).min(len);
        if ceiling == len {
            spans.push((start, len));
            break;
        }

        let end = find_break(chars, start + chunk_overlap + 1, ceiling, levels).unwrap_or(ceiling);
        spans.push((start, end));
        start = end - chunk_overlap;
    }

    spans
}

/// Find the right-most cut position in `lo..=hi` that falls just after a
/// separator, trying each level in order.
fn find_break(chars: &[char], lo: usize, hi: usize, levels: &[&[&str]]) -> Option<usize> {
    for separators in levels {
        let best = separators
            .iter()
            .filter_map(|separator| {
                let sep: Vec<char> = separator.chars().collect();
                (lo..=hi).rev().find(|&pos| pos >= sep.len() && chars[pos - sep.len()..pos] == sep[..])
            })
            .max();
        if best.is_some() {
            return best;
        }
    }
    None
}

fn build_chunks(document: &Document, chars: &[char], spans: Vec<(usize, usize)>) -> Vec<Chunk> {
    spans
        .into_iter()
        .enumerate()
        .map(|(index, (start, end))| {
            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), index.to_string());
            Chunk {
                id: format!("{}_{index}", document.id),
                text: chars[start..end].iter().collect(),
                document_id: document.id.clone(),
                index,
                start_char: start,
                metadata,
            }
        })
        .collect()
}
