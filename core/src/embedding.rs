//! Text embedding capability.
//!
//! Embeddings are dense vector representations of text. Similar texts produce
//! similar vectors, which is what makes nearest-neighbor retrieval over a
//! document corpus work. An embedding model is identified by its
//! [`EmbeddingIdentity`]: the model name and the vector dimensionality it
//! produces. An index built with one identity can only be queried with the
//! same identity — mixing models silently would return garbage neighbors, so
//! the pipeline treats a mismatch as a configuration error.

use core::future::Future;

use serde::{Deserialize, Serialize};

/// A type alias for an embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// The `(model, dimensionality)` pair that must match between index build
/// time and query time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingIdentity {
    /// Model name, e.g. `nomic-embed-text`.
    pub model: String,
    /// Length of the vectors the model produces.
    pub dim: usize,
}

impl EmbeddingIdentity {
    /// Creates an identity from a model name and dimension.
    #[must_use]
    pub fn new(model: impl Into<String>, dim: usize) -> Self {
        Self {
            model: model.into(),
            dim,
        }
    }
}

impl core::fmt::Display for EmbeddingIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({}d)", self.model, self.dim)
    }
}

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - [`embed`](EmbeddingModel::embed) must return vectors with length equal
///   to [`dim`](EmbeddingModel::dim).
/// - Embedding must be deterministic for a fixed [`model_id`](EmbeddingModel::model_id):
///   the same text always maps to the same vector.
pub trait EmbeddingModel: Send + Sync {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Returns a stable identifier for the underlying model.
    fn model_id(&self) -> &str;

    /// Converts text to an embedding vector.
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;

    /// Returns the full identity of this model.
    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity::new(self.model_id(), self.dim())
    }
}
