//! Flat cosine-similarity vector index.
//!
//! The index is a plain scan over all entries, parallelised with rayon. That
//! keeps ranking exact and tie order stable (insertion order), which an
//! approximate structure cannot guarantee, and it is comfortably fast for the
//! corpus sizes a single local snapshot holds.
//!
//! Lifecycle: an index is built whole from a batch of chunks (or decoded from
//! a snapshot) and is immutable afterwards. Ingestion replaces the entire
//! index; there is no incremental merge.

use std::cmp::Ordering;

use rayon::prelude::*;

use docqa_core::{EmbeddingIdentity, EmbeddingModel};

use crate::error::{RagError, Result};
use crate::types::{Chunk, IndexEntry, SearchResult};

/// An immutable, exhaustively-scanned vector index.
#[derive(Clone, Debug)]
pub struct FlatIndex {
    identity: EmbeddingIdentity,
    entries: Vec<IndexEntry>,
}

impl FlatIndex {
    /// Embeds every chunk and builds a fresh index.
    ///
    /// The build is all-or-nothing: if any embedding call fails the whole
    /// batch is rejected and no partial index is observable. Chunks whose
    /// content hash was already seen in this batch are skipped.
    ///
    /// # Errors
    /// [`RagError::Embedding`] if the embedder fails on any chunk.
    pub async fn build<M: EmbeddingModel>(embedder: &M, chunks: Vec<Chunk>) -> Result<Self> {
        let identity = embedder.identity();
        let mut seen = std::collections::HashSet::new();
        let mut entries = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if !seen.insert(chunk.content_hash) {
                tracing::debug!(chunk = %chunk.id, "skipping duplicate chunk content");
                continue;
            }
            let embedding = embedder
                .embed(&chunk.text)
                .await
                .map_err(RagError::Embedding)?;
            if embedding.len() != identity.dim {
                return Err(RagError::Embedding(anyhow::anyhow!(
                    "embedder returned {} dimensions, expected {}",
                    embedding.len(),
                    identity.dim
                )));
            }
            entries.push(IndexEntry::new(chunk, embedding));
        }

        Ok(Self { identity, entries })
    }

    /// Reassembles an index from persisted entries.
    ///
    /// # Errors
    /// [`RagError::InvalidArgument`] if any entry's vector does not match the
    /// identity's dimensionality.
    pub fn from_entries(identity: EmbeddingIdentity, entries: Vec<IndexEntry>) -> Result<Self> {
        for entry in &entries {
            if entry.embedding.len() != identity.dim {
                return Err(RagError::InvalidArgument(format!(
                    "entry {} has {} dimensions, index identity says {}",
                    entry.chunk.id,
                    entry.embedding.len(),
                    identity.dim
                )));
            }
        }
        Ok(Self { identity, entries })
    }

    /// Returns up to `k` nearest entries by cosine similarity, best first.
    /// Equal scores keep insertion order. An empty index yields an empty
    /// result, not an error.
    ///
    /// # Errors
    /// [`RagError::InvalidArgument`] if `k` is zero or the query vector has
    /// the wrong dimensionality.
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be positive".into()));
        }
        if vector.len() != self.identity.dim {
            return Err(RagError::InvalidArgument(format!(
                "query vector has {} dimensions, index expects {}",
                vector.len(),
                self.identity.dim
            )));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<SearchResult> = self
            .entries
            .par_iter()
            .map(|entry| SearchResult {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&entry.embedding, vector),
            })
            .collect();

        // Stable sort so equal scores preserve insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    /// The embedding identity this index was built with.
    #[must_use]
    pub const fn identity(&self) -> &EmbeddingIdentity {
        &self.identity
    }

    /// All entries, in insertion order. Used by persistence.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
