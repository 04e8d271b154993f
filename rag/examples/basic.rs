//! Basic ingest-and-query flow using toy in-process models.

use std::sync::atomic::{AtomicUsize, Ordering};

use docqa_core::{CompletionModel, EmbeddingModel};
use docqa_rag::types::Document;
use docqa_rag::{DocumentLoader, LoadError, Pipeline, PipelineConfig};

#[derive(Clone)]
struct DemoEmbedder;

impl EmbeddingModel for DemoEmbedder {
    fn dim(&self) -> usize {
        8
    }

    fn model_id(&self) -> &str {
        "demo"
    }

    async fn embed(&self, text: &str) -> docqa_core::Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dim()];
        for word in text.to_lowercase().split_whitespace() {
            let mut h = 0usize;
            for b in word.bytes() {
                h = h.wrapping_mul(31).wrapping_add(b as usize);
            }
            vector[h % self.dim()] += 1.0;
        }
        Ok(vector)
    }
}

/// Echoes the matching context line instead of calling a real model.
struct DemoCompleter {
    calls: AtomicUsize,
}

impl CompletionModel for DemoCompleter {
    fn model_id(&self) -> &str {
        "demo"
    }

    async fn complete(&self, prompt: &str) -> docqa_core::Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let context = prompt
            .lines()
            .find(|line| line.contains("attendance"))
            .unwrap_or("(no matching context)");
        Ok(format!("According to the documents: {context}"))
    }
}

struct DemoSource;

impl DocumentLoader for DemoSource {
    fn name(&self) -> String {
        "demo".into()
    }

    fn load(&self) -> Result<Vec<Document>, LoadError> {
        Ok(vec![
            Document::new("policy", "The policy requires 75% attendance."),
            Document::new("refunds", "Refunds are processed within 14 days."),
        ])
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = PipelineConfig::builder().index_dir(dir.path()).build();
    let completer = DemoCompleter {
        calls: AtomicUsize::new(0),
    };
    let mut pipeline = Pipeline::new(DemoEmbedder, completer, config)?;

    let sources: Vec<Box<dyn DocumentLoader>> = vec![Box::new(DemoSource)];
    let report = pipeline.ingest(&sources).await?;
    println!(
        "indexed {} chunks from {} documents",
        report.chunks_indexed, report.documents
    );

    let answer = pipeline.query("What is the attendance requirement?").await?;
    println!("{answer}");
    Ok(())
}
