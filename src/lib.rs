//! # docqa
//!
//! Facade crate that re-exports everything from [`docqa_core`] plus the
//! high-level pipeline and provider crates behind feature flags. Pull this
//! crate into your binary to answer natural-language questions over a local
//! document corpus.
//!
//! ## What's inside?
//!
//! - [`EmbeddingModel`](docqa_core::EmbeddingModel) and
//!   [`CompletionModel`](docqa_core::CompletionModel) — capability traits any
//!   backend can implement.
//! - `docqa-rag` (feature `rag`) — chunking, the vector index and its on-disk
//!   snapshot, answer synthesis, and the ingest/query pipeline.
//! - `docqa-ollama` (feature `ollama`) — a local Ollama adapter implementing
//!   both capability traits over HTTP.
//!
//! ## Example
//!
//! ```rust,no_run
//! use docqa::rag::{Pipeline, PipelineConfig};
//! use docqa::rag::loader::{DocumentLoader, TextFileLoader};
//! use docqa::ollama::Ollama;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let ollama = Ollama::builder().build()?;
//! let config = PipelineConfig::builder()
//!     .index_dir("./doc_index")
//!     .build();
//! let mut pipeline = Pipeline::new(ollama.clone(), ollama, config)?;
//!
//! let sources: Vec<Box<dyn DocumentLoader>> =
//!     vec![Box::new(TextFileLoader::new("./docs/policy.txt"))];
//! let report = pipeline.ingest(&sources).await?;
//! println!("indexed {} chunks", report.chunks_indexed);
//!
//! let answer = pipeline.query("What is the attendance requirement?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub use docqa_core::*;

#[cfg(feature = "rag")]
pub use docqa_rag as rag;

#[cfg(feature = "ollama")]
pub use docqa_ollama as ollama;
