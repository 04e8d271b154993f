//! # docqa-core
//!
//! Capability traits that power the rest of the workspace. The pipeline in
//! `docqa-rag` depends only on these traits, so any backend — a hosted API, a
//! local inference server, or a test stub — plugs in by implementing them.
//!
//! | Capability | Trait | Description |
//! |------------|-------|-------------|
//! | **Embeddings** | [`EmbeddingModel`] | Convert text to fixed-length vectors |
//! | **Completion** | [`CompletionModel`] | Produce a text completion for a prompt |
//!
//! ## Example
//!
//! ```rust
//! use docqa_core::EmbeddingModel;
//!
//! struct ZeroEmbedder;
//!
//! impl EmbeddingModel for ZeroEmbedder {
//!     fn dim(&self) -> usize {
//!         384
//!     }
//!
//!     fn model_id(&self) -> &str {
//!         "zero"
//!     }
//!
//!     async fn embed(&self, _text: &str) -> docqa_core::Result<Vec<f32>> {
//!         Ok(vec![0.0; self.dim()])
//!     }
//! }
//! ```

pub mod completion;
pub mod embedding;

pub use completion::CompletionModel;
pub use embedding::{Embedding, EmbeddingIdentity, EmbeddingModel};

/// Workspace-wide result type for capability boundaries.
///
/// Providers surface their own typed errors internally and convert to
/// [`anyhow::Error`] at the trait boundary, so the pipeline can stay generic
/// over backends.
pub type Result<T> = anyhow::Result<T>;

pub use anyhow::Error;
