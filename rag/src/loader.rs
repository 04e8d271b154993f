//! Document sources.
//!
//! A [`DocumentLoader`] turns some external source into whole [`Document`]s —
//! never partially-constructed ones. Loaders fail as a unit with a
//! [`LoadError`]; the pipeline catches those per source so one bad file does
//! not abort the rest of an ingestion batch.
//!
//! Heavyweight format parsing (PDF, DOCX, OCR) and database drivers live
//! outside this crate; anything that can produce text can implement the
//! trait. What lives here is the plain-text file loader and the pure
//! row-to-document formatting used for relational table rows.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::{Document, Metadata};

/// A source failed to produce documents.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the unreadable source.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The source was read but its content is unusable.
    #[error("{source_name}: {reason}")]
    Malformed {
        /// Name of the source.
        source_name: String,
        /// Why the content is unusable.
        reason: String,
    },
}

/// Produces documents from one external source.
pub trait DocumentLoader: Send + Sync {
    /// Human-readable source name, used in ingestion reports.
    fn name(&self) -> String;

    /// Loads every document from this source.
    ///
    /// # Errors
    /// A [`LoadError`] covering the whole source; implementations must not
    /// return partially-constructed documents.
    fn load(&self) -> Result<Vec<Document>, LoadError>;
}

/// Loads one UTF-8 text file as a single document.
#[derive(Debug, Clone)]
pub struct TextFileLoader {
    path: PathBuf,
}

impl TextFileLoader {
    /// Creates a loader for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this loader reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentLoader for TextFileLoader {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Vec<Document>, LoadError> {
        let text = fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let id = self
            .path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().to_string());

        let mut metadata = Metadata::new();
        metadata.insert("path".into(), self.path.display().to_string());

        Ok(vec![Document::with_metadata(id, text, metadata)])
    }
}

/// Formats one tabular row as a document: `"col: val, col: val, ..."`.
///
/// Pure and deterministic, so row serialization is testable without any
/// database driver. Columns and values are paired positionally; extra entries
/// on either side are ignored.
#[must_use]
pub fn row_document(
    table: &str,
    row_index: usize,
    columns: &[String],
    values: &[String],
) -> Document {
    let text = columns
        .iter()
        .zip(values)
        .map(|(col, val)| format!("{col}: {val}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut metadata = Metadata::new();
    metadata.insert("table".into(), table.to_owned());
    metadata.insert("row".into(), row_index.to_string());

    Document::with_metadata(format!("{table}#row_{row_index}"), text, metadata)
}

/// Wraps pre-fetched relational rows as a document source.
///
/// The database connector that produced the rows stays external; by the time
/// a `RowLoader` exists the rows are plain strings.
#[derive(Debug, Clone)]
pub struct RowLoader {
    table: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RowLoader {
    /// Creates a loader over pre-fetched rows.
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Self {
        Self {
            table: table.into(),
            columns,
            rows,
        }
    }
}

impl DocumentLoader for RowLoader {
    fn name(&self) -> String {
        format!("table:{}", self.table)
    }

    fn load(&self) -> Result<Vec<Document>, LoadError> {
        Ok(self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| row_document(&self.table, i, &self.columns, row))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn row_document_formats_columns_and_values() {
        let doc = row_document(
            "employees",
            0,
            &strings(&["name", "age", "department"]),
            &strings(&["Priya", "23", "AI & Robotics"]),
        );
        assert_eq!(doc.text, "name: Priya, age: 23, department: AI & Robotics");
        assert_eq!(doc.id, "employees#row_0");
        assert_eq!(doc.metadata.get("table").unwrap(), "employees");
    }

    #[test]
    fn row_document_ignores_unpaired_values() {
        let doc = row_document("t", 1, &strings(&["a", "b"]), &strings(&["1", "2", "3"]));
        assert_eq!(doc.text, "a: 1, b: 2");
    }

    #[test]
    fn text_file_loader_reads_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "The policy requires 75% attendance.").unwrap();

        let docs = TextFileLoader::new(&path).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "The policy requires 75% attendance.");
        assert_eq!(docs[0].id, "notes.txt");
        assert!(docs[0].metadata.contains_key("path"));
    }

    #[test]
    fn text_file_loader_missing_file_fails_whole_source() {
        let err = TextFileLoader::new("/definitely/not/here.txt")
            .load()
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn row_loader_yields_one_document_per_row() {
        let loader = RowLoader::new(
            "employees",
            strings(&["name", "age"]),
            vec![strings(&["Ann", "31"]), strings(&["Bo", "45"])],
        );
        let docs = loader.load().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1].text, "name: Bo, age: 45");
        assert_eq!(loader.name(), "table:employees");
    }
}
