//! Interactive CLI for asking questions about a directory of documents.
//!
//! On startup, optionally re-indexes every `.txt` file under `--data-dir`,
//! then either answers a single `--question` (headless mode) or drops into a
//! REPL backed by a local Ollama server.
//!
//! # Usage
//!
//! ```bash
//! # Index ./docs and start the REPL
//! cargo run -p docqa-cli -- --data-dir ./docs
//!
//! # Headless mode (single question, useful for scripting)
//! cargo run -p docqa-cli -- --data-dir ./docs --question "What is the refund policy?"
//!
//! # Query an existing index without re-indexing
//! cargo run -p docqa-cli -- --index-dir ./doc_index
//!
//! # Non-default models
//! cargo run -p docqa-cli -- --model llama3 --embedding-model mxbai-embed-large --embedding-dim 1024
//! ```

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docqa_ollama::Ollama;
use docqa_rag::{DocumentLoader, Pipeline, PipelineConfig, TextFileLoader};

/// Ask questions about a directory of documents.
#[derive(Parser, Debug)]
#[command(name = "docqa", version, about)]
struct Args {
    /// Directory of .txt files to (re-)index on startup. Skipped if omitted.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Directory holding the index snapshot.
    #[arg(long, default_value = "./doc_index")]
    index_dir: PathBuf,

    /// Ollama server base URL.
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// Completion model name.
    #[arg(short, long, default_value = "mistral")]
    model: String,

    /// Embedding model name.
    #[arg(long, default_value = "nomic-embed-text")]
    embedding_model: String,

    /// Embedding dimensionality of the embedding model.
    #[arg(long, default_value_t = 768)]
    embedding_dim: usize,

    /// Number of chunks retrieved per question.
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Single question to answer (headless mode). Answers and exits.
    #[arg(short, long)]
    question: Option<String>,

    /// Quiet mode. Only output the answer (useful with --question).
    #[arg(long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let ollama = Ollama::builder()
        .base_url(&args.base_url)
        .completion_model(&args.model)
        .embedding_model(&args.embedding_model)
        .embedding_dim(args.embedding_dim)
        .build()?;

    let config = PipelineConfig::builder()
        .index_dir(&args.index_dir)
        .top_k(args.top_k)
        .build();
    let mut pipeline = Pipeline::new(ollama.clone(), ollama, config)?;

    if let Some(ref data_dir) = args.data_dir {
        ingest_directory(&mut pipeline, data_dir, args.quiet).await?;
    }

    if !args.quiet {
        println!("docqa");
        println!("Completion model: {}", args.model);
        println!("Embedding model: {}", args.embedding_model);
        if args.question.is_none() {
            println!("Commands: /quit, /history");
        }
        println!();
    }

    if let Some(ref question) = args.question {
        return run_headless(&pipeline, question).await;
    }

    run_repl(&pipeline).await
}

/// Collects every `.txt` file under `data_dir` and rebuilds the index.
async fn ingest_directory(
    pipeline: &mut Pipeline<Ollama, Ollama>,
    data_dir: &Path,
    quiet: bool,
) -> Result<()> {
    let mut sources: Vec<Box<dyn DocumentLoader>> = Vec::new();
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("failed to read data directory {}", data_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "txt") {
            sources.push(Box::new(TextFileLoader::new(path)));
        }
    }

    if sources.is_empty() {
        anyhow::bail!("no .txt files found in {}", data_dir.display());
    }

    let report = pipeline.ingest(&sources).await?;
    if !quiet {
        println!(
            "Indexed {} chunks from {} documents ({} sources).",
            report.chunks_indexed,
            report.documents,
            report.sources_ok.len()
        );
        for (name, reason) in &report.sources_failed {
            eprintln!("Warning: skipped {name}: {reason}");
        }
    }
    Ok(())
}

/// Answer a single question and exit (headless mode).
async fn run_headless(pipeline: &Pipeline<Ollama, Ollama>, question: &str) -> Result<()> {
    match pipeline.query(question).await {
        Ok(answer) => {
            println!("{answer}");
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_repl(pipeline: &Pipeline<Ollama, Ollama>) -> Result<()> {
    println!("Ready. Ask a question or type a command.\n");

    let stdin = io::stdin();
    loop {
        print!("You> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match input {
                "/quit" | "/exit" | "/q" => break,
                "/history" => {
                    print_history(pipeline);
                    continue;
                }
                cmd => {
                    println!("Unknown command: {cmd}");
                    println!("Available: /quit, /history");
                    continue;
                }
            }
        }

        println!("\nAnswer>");
        match pipeline.query(input).await {
            Ok(answer) => println!("{answer}"),
            Err(e) => println!("\x1b[31mError: {e}\x1b[0m"),
        }
        println!();
    }

    println!("Goodbye!");
    Ok(())
}

fn print_history(pipeline: &Pipeline<Ollama, Ollama>) {
    let history = pipeline.history();
    if history.is_empty() {
        println!("No questions asked yet.");
    } else {
        println!("Session history ({} turns):", history.len());
        for turn in &history {
            println!("  [You] {}", truncate(&turn.question, 100));
            println!("  [Answer] {}", truncate(&turn.answer, 100));
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}
