//! Pipeline configuration.

use std::path::PathBuf;

use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};

/// Configuration for a [`Pipeline`](crate::Pipeline).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the index snapshot. Owned exclusively by the
    /// pipeline; wiped and rewritten on every ingestion.
    pub index_dir: PathBuf,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Character budget for the context block of a prompt.
    pub max_context_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./doc_index"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_OVERLAP,
            top_k: 5,
            max_context_chars: 4000,
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index_dir = dir.into();
        self
    }

    /// Sets the maximum chunk size in characters.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Sets the overlap between consecutive chunks in characters.
    #[must_use]
    pub const fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Sets the number of chunks retrieved per query.
    #[must_use]
    pub const fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Sets the character budget for prompt context.
    #[must_use]
    pub const fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Builds the configuration. Validation happens when the pipeline is
    /// constructed, where the invalid combination can be reported with
    /// context.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}
