//! Retrieval-augmented document question answering.
//!
//! This crate turns a pile of documents into something a language model can
//! answer questions about. The moving parts, in ingestion order:
//!
//! - [`loader`]: sources that yield [`Document`](types::Document)s, including
//!   plain-text files and pre-fetched relational rows.
//! - [`chunking`]: splits documents into overlapping, boundary-snapped
//!   chunks.
//! - [`index`]: an in-memory flat index scored by cosine similarity with a
//!   parallel scan.
//! - [`persistence`]: wipe-and-rewrite binary snapshots of the index.
//! - [`synthesize`]: budgeted prompt assembly over the retrieved passages.
//! - [`pipeline`]: the orchestrator tying the above to the embedding and
//!   completion capabilities from `docqa-core`.
//!
//! ```no_run
//! use docqa_rag::{Pipeline, PipelineConfig, TextFileLoader, DocumentLoader};
//! # async fn run(embedder: impl docqa_core::EmbeddingModel,
//! #              completer: impl docqa_core::CompletionModel) -> docqa_rag::Result<()> {
//! let mut pipeline = Pipeline::new(embedder, completer, PipelineConfig::default())?;
//! let sources: Vec<Box<dyn DocumentLoader>> =
//!     vec![Box::new(TextFileLoader::new("handbook.txt"))];
//! pipeline.ingest(&sources).await?;
//! let answer = pipeline.query("What is the attendance requirement?").await?;
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod config;
pub mod dedup;
pub mod error;
pub mod index;
pub mod loader;
pub mod persistence;
pub mod pipeline;
pub mod synthesize;
pub mod types;

pub use chunking::{Chunker, FixedSizeChunker, DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{RagError, Result};
pub use index::FlatIndex;
pub use loader::{row_document, DocumentLoader, LoadError, RowLoader, TextFileLoader};
pub use persistence::SnapshotStore;
pub use pipeline::Pipeline;
pub use synthesize::{Synthesizer, NO_CONTEXT_ANSWER};
pub use types::{ChatTurn, Chunk, Document, IngestReport, IndexEntry, Metadata, SearchResult};
