//! Error types for the pipeline.

use std::path::PathBuf;
use thiserror::Error;

use docqa_core::EmbeddingIdentity;

/// Errors that can occur in pipeline operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid configuration (bad chunking parameters, empty index path).
    /// Fatal; surfaced at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Caller misuse of an otherwise healthy component (`k == 0`, query
    /// vector of the wrong dimension). Fatal to the call only.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Embedding a chunk or query failed. Aborts the current ingest or query.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// The completion capability failed while synthesizing an answer.
    #[error("answer synthesis failed: {0}")]
    Synthesis(#[source] anyhow::Error),

    /// No snapshot exists at the index path. Callers should prompt for
    /// re-ingestion rather than crash.
    #[error("no index snapshot at {0}; ingest documents first")]
    IndexNotFound(PathBuf),

    /// A snapshot exists but cannot be decoded. Distinguished from
    /// [`RagError::IndexNotFound`] so callers can decide to rebuild vs. abort.
    #[error("index snapshot at {path} is corrupt: {reason}")]
    IndexCorrupt {
        /// Snapshot path.
        path: PathBuf,
        /// Why decoding failed.
        reason: String,
    },

    /// The index was built with a different embedding identity than the
    /// configured embedder. A configuration error, never silent degradation.
    #[error("embedding identity mismatch: index built with {index}, embedder is {embedder}")]
    IdentityMismatch {
        /// Identity recorded in the snapshot.
        index: EmbeddingIdentity,
        /// Identity of the configured embedder.
        embedder: EmbeddingIdentity,
    },

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
