//! Document chunking.
//!
//! Splits documents into overlapping windows of at most `chunk_size`
//! characters (Unicode scalar values). The window advances by
//! `chunk_size - overlap` each step, preferring to end on a paragraph,
//! sentence, or word boundary found within a bounded lookback region; when no
//! boundary is available it falls back to a hard cut so progress is always
//! guaranteed.

use unicode_segmentation::UnicodeSegmentation;

use crate::dedup::content_hash;
use crate::error::{RagError, Result};
use crate::types::{Chunk, Document};

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 150;

/// Trait for document chunking strategies.
pub trait Chunker: Send + Sync {
    /// Splits the document into chunks. Pure; never fails for a well-formed
    /// document.
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>>;

    /// Returns the chunker name.
    fn name(&self) -> &'static str;
}

/// Sliding-window chunker with boundary snapping.
#[derive(Clone, Debug)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for FixedSizeChunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl FixedSizeChunker {
    /// Creates a chunker with the given window size and overlap, both in
    /// characters.
    ///
    /// # Errors
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `overlap >= chunk_size` (the window would never advance).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Configured maximum chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Configured overlap.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// How far back from the window end we search for a natural boundary.
    fn lookback(&self) -> usize {
        (self.chunk_size / 4).min(200).max(1)
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, doc: &Document) -> Result<Vec<Chunk>> {
        if doc.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Byte offset of every char position, plus the end sentinel, so the
        // window arithmetic can stay in characters while slicing stays valid.
        let mut offsets: Vec<usize> = doc.text.char_indices().map(|(b, _)| b).collect();
        offsets.push(doc.text.len());
        let total_chars = offsets.len() - 1;

        if total_chars <= self.chunk_size {
            let chunk = Chunk::with_metadata(
                format!("{}#chunk_0", doc.id),
                doc.text.clone(),
                doc.id.clone(),
                0,
                content_hash(&doc.text),
                doc.metadata.clone(),
            );
            return Ok(vec![chunk]);
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0usize;

        while start < total_chars {
            let raw_end = (start + self.chunk_size).min(total_chars);
            let mut end = if raw_end < total_chars {
                snap_to_boundary(&doc.text, &offsets, start, raw_end, self.lookback())
            } else {
                raw_end
            };

            // A snapped end that does not clear the overlap would stall the
            // window; hard-cut instead.
            if end <= start + self.overlap {
                end = raw_end;
            }

            let text = &doc.text[offsets[start]..offsets[end]];
            if !text.trim().is_empty() {
                chunks.push(Chunk::with_metadata(
                    format!("{}#chunk_{index}", doc.id),
                    text,
                    doc.id.clone(),
                    index,
                    content_hash(text),
                    doc.metadata.clone(),
                ));
                index += 1;
            }

            if end >= total_chars {
                break;
            }
            start = end - self.overlap;
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "fixed_size"
    }
}

/// Finds the best natural break position in `(raw_end - lookback, raw_end]`,
/// preferring paragraph over sentence over word boundaries. Returns a char
/// position; falls back to `raw_end` when nothing suitable exists.
fn snap_to_boundary(
    text: &str,
    offsets: &[usize],
    start: usize,
    raw_end: usize,
    lookback: usize,
) -> usize {
    let floor = raw_end.saturating_sub(lookback).max(start + 1);

    // Paragraph break: cut after the blank line.
    for pos in (floor..raw_end).rev() {
        if text[offsets[pos]..].starts_with('\n') && pos > 0 && text[offsets[pos - 1]..].starts_with('\n')
        {
            return pos + 1;
        }
    }

    let window = &text[offsets[start]..offsets[raw_end]];
    let floor_byte = offsets[floor] - offsets[start];

    // Sentence boundary within the lookback region.
    let mut best_sentence = None;
    for (byte_off, _) in window.split_sentence_bound_indices() {
        if byte_off >= floor_byte && byte_off > 0 {
            best_sentence = Some(byte_off);
        }
    }
    if let Some(byte_off) = best_sentence {
        return start + window[..byte_off].chars().count();
    }

    // Word boundary within the lookback region.
    let mut best_word = None;
    for (byte_off, _) in window.split_word_bound_indices() {
        if byte_off >= floor_byte && byte_off > 0 {
            best_word = Some(byte_off);
        }
    }
    if let Some(byte_off) = best_word {
        return start + window[..byte_off].chars().count();
    }

    raw_end
}
