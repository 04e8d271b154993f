//! Binary snapshot persistence for the vector index.
//!
//! A snapshot is a directory owned exclusively by the pipeline, containing a
//! single rkyv-encoded file. The encoding carries a format version and the
//! embedding identity alongside the entries, so a stale or foreign snapshot
//! is detected instead of silently searched. Every ingestion replaces the
//! snapshot whole, staged through a sibling file and renamed into place, so
//! a failed write leaves the previous snapshot readable; there is no merge
//! and no rollback.

use rkyv::rancor::Error as RkyvError;
use rkyv::{from_bytes, to_bytes};
use std::fs;
use std::path::{Path, PathBuf};

use docqa_core::EmbeddingIdentity;

use crate::error::{RagError, Result};
use crate::index::FlatIndex;
use crate::types::IndexEntry;

const SNAPSHOT_FILE: &str = "index.bin";
const SNAPSHOT_TMP: &str = "index.bin.tmp";
const FORMAT_VERSION: u32 = 1;

/// Wrapper for serialization with rkyv.
#[derive(rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
struct SnapshotData {
    version: u32,
    model: String,
    dim: u32,
    entries: Vec<EntryData>,
}

/// Internal entry data for rkyv serialization.
#[derive(Clone, rkyv::Archive, rkyv::Serialize, rkyv::Deserialize)]
#[rkyv(derive(Debug))]
struct EntryData {
    chunk_id: String,
    chunk_text: String,
    chunk_source_id: String,
    chunk_index: u32,
    chunk_content_hash: u64,
    chunk_metadata: Vec<(String, String)>,
    embedding: Vec<f32>,
}

impl From<&IndexEntry> for EntryData {
    fn from(entry: &IndexEntry) -> Self {
        Self {
            chunk_id: entry.chunk.id.clone(),
            chunk_text: entry.chunk.text.clone(),
            chunk_source_id: entry.chunk.source_id.clone(),
            chunk_index: u32::try_from(entry.chunk.index).unwrap_or(u32::MAX),
            chunk_content_hash: entry.chunk.content_hash,
            chunk_metadata: entry
                .chunk
                .metadata
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            embedding: entry.embedding.clone(),
        }
    }
}

impl From<EntryData> for IndexEntry {
    fn from(data: EntryData) -> Self {
        use crate::types::{Chunk, Metadata};

        let metadata: Metadata = data.chunk_metadata.into_iter().collect();
        let chunk = Chunk::with_metadata(
            data.chunk_id,
            data.chunk_text,
            data.chunk_source_id,
            data.chunk_index as usize,
            data.chunk_content_hash,
            metadata,
        );
        Self::new(chunk, data.embedding)
    }
}

/// Reads and writes index snapshots under a dedicated directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store rooted at the given snapshot directory. The directory
    /// is created lazily on the first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The snapshot directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Deletes the snapshot directory and everything in it. Missing
    /// directories are fine.
    ///
    /// # Errors
    /// [`RagError::Io`] if the directory exists but cannot be removed.
    pub fn wipe(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes a snapshot of the index, replacing any previous one.
    ///
    /// The bytes are staged into a sibling file and renamed over the
    /// snapshot, so a write that fails partway leaves the previous snapshot
    /// intact and loadable.
    ///
    /// # Errors
    /// [`RagError::Serialization`] if encoding fails, [`RagError::Io`] if the
    /// file cannot be written.
    pub fn save(&self, index: &FlatIndex) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let identity = index.identity();
        let data = SnapshotData {
            version: FORMAT_VERSION,
            model: identity.model.clone(),
            dim: u32::try_from(identity.dim)
                .map_err(|_| RagError::Serialization("embedding dimension overflow".into()))?,
            entries: index.entries().iter().map(EntryData::from).collect(),
        };

        let bytes =
            to_bytes::<RkyvError>(&data).map_err(|e| RagError::Serialization(e.to_string()))?;
        let staging = self.dir.join(SNAPSHOT_TMP);
        fs::write(&staging, &bytes)?;
        fs::rename(&staging, self.snapshot_path())?;

        tracing::debug!(
            path = %self.snapshot_path().display(),
            entries = index.len(),
            "index snapshot written"
        );
        Ok(())
    }

    /// Loads the snapshot back into an index.
    ///
    /// # Errors
    /// [`RagError::IndexNotFound`] if no snapshot exists,
    /// [`RagError::IndexCorrupt`] if the bytes cannot be decoded or carry an
    /// unknown format version.
    pub fn load(&self) -> Result<FlatIndex> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Err(RagError::IndexNotFound(path));
        }

        let bytes = fs::read(&path)?;
        let data =
            from_bytes::<SnapshotData, RkyvError>(&bytes).map_err(|e| RagError::IndexCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        if data.version != FORMAT_VERSION {
            return Err(RagError::IndexCorrupt {
                path,
                reason: format!(
                    "unsupported snapshot format version {} (expected {FORMAT_VERSION})",
                    data.version
                ),
            });
        }

        let identity = EmbeddingIdentity::new(data.model, data.dim as usize);
        let entries = data.entries.into_iter().map(IndexEntry::from).collect();
        FlatIndex::from_entries(identity, entries)
    }
}
