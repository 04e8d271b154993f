//! Core types for the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key/value metadata attached to documents and chunks.
pub type Metadata = BTreeMap<String, String>;

/// A document to be chunked and indexed.
///
/// Documents are produced by loaders and are immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier for the document.
    pub id: String,
    /// Raw text content.
    pub text: String,
    /// Arbitrary metadata for filtering/citations.
    pub metadata: Metadata,
}

impl Document {
    /// Creates a new document with empty metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    /// Creates a new document with metadata.
    #[must_use]
    pub fn with_metadata(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded text window derived from a document; the unit of embedding and
/// retrieval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier for this chunk (format: `{doc_id}#chunk_{n}`).
    pub id: String,
    /// Text content of the chunk.
    pub text: String,
    /// Parent document ID.
    pub source_id: String,
    /// Position of this chunk within the document.
    pub index: usize,
    /// Metadata inherited from the parent document.
    pub metadata: Metadata,
    /// Content hash for deduplication.
    pub content_hash: u64,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source_id: impl Into<String>,
        index: usize,
        content_hash: u64,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_id: source_id.into(),
            index,
            metadata: Metadata::new(),
            content_hash,
        }
    }

    /// Creates a new chunk with metadata.
    #[must_use]
    pub fn with_metadata(
        id: impl Into<String>,
        text: impl Into<String>,
        source_id: impl Into<String>,
        index: usize,
        content_hash: u64,
        metadata: Metadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_id: source_id.into(),
            index,
            metadata,
            content_hash,
        }
    }
}

/// A retrieval hit: a chunk and its similarity score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching chunk.
    pub chunk: Chunk,
    /// Cosine similarity score (1.0 = identical direction).
    pub score: f32,
}

/// Internal entry stored in the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk.
    pub chunk: Chunk,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// One question/answer exchange in the session history.
///
/// History lives for the lifetime of the process and is never persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    /// The question as the user asked it.
    pub question: String,
    /// The synthesized answer.
    pub answer: String,
}

/// Outcome of one ingestion run.
///
/// Ingestion isolates failures at source granularity: a source that fails to
/// load is recorded here and does not abort the rest of the batch.
#[derive(Clone, Debug, Default)]
pub struct IngestReport {
    /// Names of sources that loaded successfully.
    pub sources_ok: Vec<String>,
    /// Sources that failed to load, with the failure reason.
    pub sources_failed: Vec<(String, String)>,
    /// Number of documents produced by the successful sources.
    pub documents: usize,
    /// Number of chunks embedded and indexed.
    pub chunks_indexed: usize,
}

impl IngestReport {
    /// Returns `true` if at least one source loaded.
    #[must_use]
    pub fn any_succeeded(&self) -> bool {
        !self.sources_ok.is_empty()
    }
}
