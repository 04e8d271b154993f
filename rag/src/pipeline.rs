//! Ingest/query orchestration.
//!
//! The pipeline wires the two flows together and owns the index resource:
//!
//! - **ingest**: documents → chunks → freshly built index → snapshot on disk.
//!   Takes `&mut self`, so two ingestions can never run concurrently against
//!   the same pipeline, and a query can never observe a half-swapped index.
//! - **query**: question → embedding → top-k retrieval → synthesized answer,
//!   appended to the session history.
//!
//! The on-disk snapshot is loaded lazily on the first query and cached in
//! memory; every successful ingestion replaces both the snapshot and the
//! cache. Losing snapshot history on rebuild is deliberate: one corpus, one
//! snapshot, no rollback.

use std::sync::Arc;

use parking_lot::Mutex;

use docqa_core::{CompletionModel, EmbeddingModel};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::PipelineConfig;
use crate::error::{RagError, Result};
use crate::index::FlatIndex;
use crate::loader::DocumentLoader;
use crate::persistence::SnapshotStore;
use crate::synthesize::Synthesizer;
use crate::types::{ChatTurn, Chunk, IngestReport};

/// Orchestrates ingestion and querying over one index snapshot.
pub struct Pipeline<E, C> {
    embedder: Arc<E>,
    synthesizer: Synthesizer<C>,
    chunker: FixedSizeChunker,
    snapshots: SnapshotStore,
    config: PipelineConfig,
    cache: Mutex<Option<Arc<FlatIndex>>>,
    history: Mutex<Vec<ChatTurn>>,
}

impl<E, C> std::fmt::Debug for Pipeline<E, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("index_dir", &self.snapshots.dir())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<E, C> Pipeline<E, C>
where
    E: EmbeddingModel,
    C: CompletionModel,
{
    /// Creates a pipeline from an embedder, a completion model, and a
    /// configuration.
    ///
    /// # Errors
    /// [`RagError::Config`] if the chunking parameters or `top_k` are
    /// invalid.
    pub fn new(embedder: E, completer: C, config: PipelineConfig) -> Result<Self> {
        let chunker = FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?;
        if config.top_k == 0 {
            return Err(RagError::Config("top_k must be positive".into()));
        }

        Ok(Self {
            embedder: Arc::new(embedder),
            synthesizer: Synthesizer::new(completer),
            chunker,
            snapshots: SnapshotStore::new(&config.index_dir),
            config,
            cache: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Ingests every source, replacing the index entirely.
    ///
    /// Failures are isolated at source granularity: a loader that fails is
    /// recorded in the report and the rest of the batch continues. The
    /// embedding/build step is all-or-nothing, and the snapshot write is
    /// staged and renamed into place, so a failure at either point keeps the
    /// previous snapshot on disk and in the cache. If *every* source fails,
    /// the previous index is also kept, so a transient loader problem cannot
    /// silently empty a working corpus.
    ///
    /// # Errors
    /// [`RagError::Embedding`] if building the index fails, [`RagError::Io`] /
    /// [`RagError::Serialization`] if the snapshot cannot be written.
    pub async fn ingest(&mut self, sources: &[Box<dyn DocumentLoader>]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut documents = Vec::new();

        for source in sources {
            let name = source.name();
            match source.load() {
                Ok(docs) => {
                    tracing::info!(source = %name, documents = docs.len(), "source loaded");
                    report.sources_ok.push(name);
                    documents.extend(docs);
                }
                Err(err) => {
                    tracing::warn!(source = %name, error = %err, "source failed, skipping");
                    report.sources_failed.push((name, err.to_string()));
                }
            }
        }

        if !report.any_succeeded() {
            tracing::warn!("no source loaded successfully; keeping the existing index");
            return Ok(report);
        }
        report.documents = documents.len();

        let mut chunks: Vec<Chunk> = Vec::new();
        for doc in &documents {
            chunks.extend(self.chunker.chunk(doc)?);
        }
        tracing::debug!(
            chunker = self.chunker.name(),
            chunks = chunks.len(),
            "documents chunked"
        );

        // Build and persist before the cache swap: a failure at either step
        // must leave both the previous snapshot and the cached index intact.
        let index = FlatIndex::build(self.embedder.as_ref(), chunks).await?;
        report.chunks_indexed = index.len();

        self.snapshots.save(&index)?;
        *self.cache.lock() = Some(Arc::new(index));

        tracing::info!(
            documents = report.documents,
            chunks = report.chunks_indexed,
            failed_sources = report.sources_failed.len(),
            "ingestion complete"
        );
        Ok(report)
    }

    /// Answers a question against the current index and records the exchange
    /// in the session history.
    ///
    /// # Errors
    /// [`RagError::IndexNotFound`] / [`RagError::IndexCorrupt`] if no usable
    /// snapshot exists, [`RagError::IdentityMismatch`] if the snapshot was
    /// built with a different embedding identity, [`RagError::Embedding`] /
    /// [`RagError::Synthesis`] if a capability call fails.
    pub async fn query(&self, question: &str) -> Result<String> {
        let index = self.current_index()?;

        let expected = self.embedder.identity();
        if index.identity() != &expected {
            return Err(RagError::IdentityMismatch {
                index: index.identity().clone(),
                embedder: expected,
            });
        }

        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(RagError::Embedding)?;

        let passages: Vec<String> = if index.is_empty() {
            Vec::new()
        } else {
            index
                .search(&vector, self.config.top_k)?
                .into_iter()
                .map(|hit| hit.chunk.text)
                .collect()
        };
        tracing::debug!(question, passages = passages.len(), "retrieval complete");

        let answer = self
            .synthesizer
            .answer(question, &passages, self.config.max_context_chars)
            .await?;

        self.history.lock().push(ChatTurn {
            question: question.to_owned(),
            answer: answer.clone(),
        });
        Ok(answer)
    }

    /// Returns the session history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<ChatTurn> {
        self.history.lock().clone()
    }

    /// Number of chunks in the current index, if one is loaded or loadable.
    ///
    /// # Errors
    /// Same as [`Pipeline::query`] for snapshot access.
    pub fn index_len(&self) -> Result<usize> {
        Ok(self.current_index()?.len())
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the cached index, loading the snapshot on first use.
    fn current_index(&self) -> Result<Arc<FlatIndex>> {
        let mut cache = self.cache.lock();
        if let Some(index) = cache.as_ref() {
            return Ok(Arc::clone(index));
        }
        let loaded = Arc::new(self.snapshots.load()?);
        tracing::info!(entries = loaded.len(), "index snapshot loaded");
        *cache = Some(Arc::clone(&loaded));
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadError, TextFileLoader};
    use crate::synthesize::NO_CONTEXT_ANSWER;
    use crate::types::Document;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Deterministic bag-of-words embedder: close vectors for texts sharing
    /// words, so retrieval behaves like the real thing.
    #[derive(Clone)]
    struct BagEmbedder {
        dim: usize,
    }

    impl EmbeddingModel for BagEmbedder {
        fn dim(&self) -> usize {
            self.dim
        }

        fn model_id(&self) -> &str {
            "bag"
        }

        async fn embed(&self, text: &str) -> docqa_core::Result<Vec<f32>> {
            let mut vec = vec![0.0f32; self.dim];
            for word in text.to_lowercase().split_whitespace() {
                let mut h = 0usize;
                for b in word.bytes() {
                    h = h.wrapping_mul(31).wrapping_add(b as usize);
                }
                vec[h % self.dim] += 1.0;
            }
            Ok(vec)
        }
    }

    /// Completion stub that answers with the last digit-bearing token of its
    /// prompt.
    struct LastNumberCompleter {
        calls: Arc<AtomicUsize>,
    }

    impl CompletionModel for LastNumberCompleter {
        fn model_id(&self) -> &str {
            "last-number"
        }

        async fn complete(&self, prompt: &str) -> docqa_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let last = prompt
                .split_whitespace()
                .filter(|tok| tok.chars().any(|c| c.is_ascii_digit()))
                .next_back()
                .unwrap_or("no number");
            Ok(last.trim_matches(|c: char| c == '.' || c == ',').to_owned())
        }
    }

    struct FailingLoader;

    impl DocumentLoader for FailingLoader {
        fn name(&self) -> String {
            "<corrupt>".into()
        }

        fn load(&self) -> std::result::Result<Vec<Document>, LoadError> {
            Err(LoadError::Malformed {
                source_name: "<corrupt>".into(),
                reason: "extraction failed".into(),
            })
        }
    }

    struct StaticLoader {
        id: &'static str,
        text: &'static str,
    }

    impl DocumentLoader for StaticLoader {
        fn name(&self) -> String {
            self.id.into()
        }

        fn load(&self) -> std::result::Result<Vec<Document>, LoadError> {
            Ok(vec![Document::new(self.id, self.text)])
        }
    }

    fn pipeline(
        index_dir: &std::path::Path,
    ) -> (Pipeline<BagEmbedder, LastNumberCompleter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = LastNumberCompleter {
            calls: Arc::clone(&calls),
        };
        let config = PipelineConfig::builder()
            .index_dir(index_dir)
            .chunk_size(2000)
            .chunk_overlap(150)
            .build();
        let p = Pipeline::new(BagEmbedder { dim: 16 }, completer, config).unwrap();
        (p, calls)
    }

    fn boxed(loader: impl DocumentLoader + 'static) -> Box<dyn DocumentLoader> {
        Box::new(loader)
    }

    #[test]
    fn invalid_chunking_config_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = LastNumberCompleter { calls };
        let config = PipelineConfig::builder()
            .chunk_size(100)
            .chunk_overlap(100)
            .build();
        assert!(matches!(
            Pipeline::new(BagEmbedder { dim: 4 }, completer, config),
            Err(RagError::Config(_))
        ));
    }

    #[tokio::test]
    async fn attendance_scenario_end_to_end() {
        let dir = tempdir().unwrap();
        let (mut p, calls) = pipeline(&dir.path().join("index"));

        let sources = vec![boxed(StaticLoader {
            id: "policy",
            text: "The policy requires 75% attendance.",
        })];
        let report = p.ingest(&sources).await.unwrap();
        assert_eq!(report.documents, 1);
        assert_eq!(report.chunks_indexed, 1);

        let answer = p.query("What is the attendance requirement?").await.unwrap();
        assert!(answer.contains("75%"), "answer was {answer:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let history = p.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "What is the attendance requirement?");
        assert_eq!(history[0].answer, answer);
    }

    #[tokio::test]
    async fn bad_source_does_not_abort_the_batch() {
        let dir = tempdir().unwrap();
        let (mut p, _) = pipeline(&dir.path().join("index"));

        let sources = vec![
            boxed(StaticLoader {
                id: "good",
                text: "A good doc",
            }),
            boxed(FailingLoader),
        ];
        let report = p.ingest(&sources).await.unwrap();

        assert_eq!(report.sources_ok, vec!["good".to_string()]);
        assert_eq!(report.sources_failed.len(), 1);
        assert_eq!(report.sources_failed[0].0, "<corrupt>");
        assert_eq!(report.chunks_indexed, 1);
        assert_eq!(p.index_len().unwrap(), 1);
    }

    #[tokio::test]
    async fn query_without_snapshot_reports_not_found() {
        let dir = tempdir().unwrap();
        let (p, _) = pipeline(&dir.path().join("index"));
        assert!(matches!(
            p.query("anything?").await,
            Err(RagError::IndexNotFound(_))
        ));
    }

    #[tokio::test]
    async fn all_sources_failed_keeps_existing_index() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");
        let (mut p, _) = pipeline(&index_dir);

        p.ingest(&[boxed(StaticLoader {
            id: "keep",
            text: "original corpus content",
        })])
        .await
        .unwrap();

        let report = p.ingest(&[boxed(FailingLoader)]).await.unwrap();
        assert!(!report.any_succeeded());
        assert_eq!(p.index_len().unwrap(), 1);
    }

    #[tokio::test]
    async fn reingest_replaces_index_and_cache() {
        let dir = tempdir().unwrap();
        let (mut p, _) = pipeline(&dir.path().join("index"));

        p.ingest(&[boxed(StaticLoader {
            id: "old",
            text: "budget is 10 units",
        })])
        .await
        .unwrap();
        let first = p.query("what is the budget in units").await.unwrap();
        assert!(first.contains("10"));

        p.ingest(&[boxed(StaticLoader {
            id: "new",
            text: "budget is 20 units",
        })])
        .await
        .unwrap();
        let second = p.query("what is the budget in units").await.unwrap();
        assert!(second.contains("20"), "stale cache answered {second:?}");
    }

    #[tokio::test]
    async fn failed_snapshot_write_keeps_previous_index() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");
        let (mut p, _) = pipeline(&index_dir);

        p.ingest(&[boxed(StaticLoader {
            id: "old",
            text: "budget is 10 units",
        })])
        .await
        .unwrap();

        // Block the snapshot's staging path so the rewrite fails mid-save.
        std::fs::create_dir_all(index_dir.join("index.bin.tmp")).unwrap();
        let err = p
            .ingest(&[boxed(StaticLoader {
                id: "new",
                text: "budget is 20 units",
            })])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Io(_)));

        // The running pipeline still serves the old corpus.
        let answer = p.query("what is the budget in units").await.unwrap();
        assert!(answer.contains("10"), "cache lost old index: {answer:?}");

        // And so does a fresh pipeline reading the same snapshot directory.
        std::fs::remove_dir_all(index_dir.join("index.bin.tmp")).unwrap();
        let (p2, _) = pipeline(&index_dir);
        let answer = p2.query("what is the budget in units").await.unwrap();
        assert!(answer.contains("10"), "snapshot lost old index: {answer:?}");
    }

    #[tokio::test]
    async fn snapshot_survives_process_restart() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");

        {
            let (mut p, _) = pipeline(&index_dir);
            p.ingest(&[boxed(StaticLoader {
                id: "doc",
                text: "The warranty lasts 24 months.",
            })])
            .await
            .unwrap();
        }

        // Fresh pipeline, same snapshot directory: lazy load on first query.
        let (p, _) = pipeline(&index_dir);
        let answer = p.query("how long is the warranty in months").await.unwrap();
        assert!(answer.contains("24"));
    }

    #[tokio::test]
    async fn mismatched_identity_is_a_configuration_error() {
        let dir = tempdir().unwrap();
        let index_dir = dir.path().join("index");

        {
            let (mut p, _) = pipeline(&index_dir);
            p.ingest(&[boxed(StaticLoader {
                id: "doc",
                text: "some content",
            })])
            .await
            .unwrap();
        }

        // Same snapshot, different embedder dimensionality.
        let completer = LastNumberCompleter {
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let config = PipelineConfig::builder().index_dir(&index_dir).build();
        let p = Pipeline::new(BagEmbedder { dim: 8 }, completer, config).unwrap();
        assert!(matches!(
            p.query("anything?").await,
            Err(RagError::IdentityMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn empty_documents_yield_empty_index_and_sentinel_answer() {
        let dir = tempdir().unwrap();
        let (mut p, calls) = pipeline(&dir.path().join("index"));

        let report = p
            .ingest(&[boxed(StaticLoader {
                id: "blank",
                text: "   \n  ",
            })])
            .await
            .unwrap();
        assert_eq!(report.chunks_indexed, 0);

        let answer = p.query("anything in here?").await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn text_file_sources_work_end_to_end() {
        let dir = tempdir().unwrap();
        let data = tempdir().unwrap();
        let file = data.path().join("handbook.txt");
        std::fs::write(&file, "Vacation allowance is 30 days per year.").unwrap();

        let (mut p, _) = pipeline(&dir.path().join("index"));
        let report = p
            .ingest(&[boxed(TextFileLoader::new(&file))])
            .await
            .unwrap();
        assert_eq!(report.documents, 1);

        let answer = p.query("how many vacation days per year").await.unwrap();
        assert!(answer.contains("30"));
    }
}
