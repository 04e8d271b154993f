//! Answer synthesis: prompt assembly and completion invocation.
//!
//! The synthesizer stuffs retrieved passages into a single prompt, most
//! relevant first, and asks the completion capability for an answer grounded
//! only in that context. The context block is budgeted in characters by
//! dropping whole passages from the low-relevance end; a passage is never cut
//! in the middle. With no usable context it short-circuits to a fixed
//! sentinel answer instead of wasting a model call.

use std::sync::Arc;

use docqa_core::CompletionModel;

use crate::error::{RagError, Result};

/// Deterministic answer returned when retrieval produced no usable context.
pub const NO_CONTEXT_ANSWER: &str = "No relevant information found in the indexed documents.";

const PASSAGE_DELIMITER: &str = "\n\n";

const INSTRUCTION: &str = "You are an assistant answering questions about a set of indexed \
documents. Use only the context below to answer the question. Quote exact figures or rules \
when available. If the context does not contain the answer, say that you do not know.";

/// Builds bounded prompts and invokes the completion capability.
pub struct Synthesizer<C> {
    completer: Arc<C>,
}

impl<C> Clone for Synthesizer<C> {
    fn clone(&self) -> Self {
        Self {
            completer: Arc::clone(&self.completer),
        }
    }
}

impl<C> std::fmt::Debug for Synthesizer<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer").finish_non_exhaustive()
    }
}

impl<C> Synthesizer<C>
where
    C: CompletionModel,
{
    /// Wraps a completion capability.
    pub fn new(completer: C) -> Self {
        Self {
            completer: Arc::new(completer),
        }
    }

    /// Answers `question` from `passages` (ordered most relevant first).
    ///
    /// # Errors
    /// [`RagError::Synthesis`] if the completion capability fails.
    pub async fn answer(
        &self,
        question: &str,
        passages: &[String],
        max_context_chars: usize,
    ) -> Result<String> {
        let kept = fit_passages(passages, max_context_chars);
        if kept == 0 {
            tracing::debug!("no passages fit the context budget, returning sentinel answer");
            return Ok(NO_CONTEXT_ANSWER.to_owned());
        }
        if kept < passages.len() {
            tracing::debug!(
                total = passages.len(),
                kept,
                "dropped low-relevance passages to fit the context budget"
            );
        }

        let prompt = build_prompt(question, &passages[..kept]);
        self.completer
            .complete(&prompt)
            .await
            .map_err(RagError::Synthesis)
    }
}

/// Returns how many leading passages fit within `max_context_chars`,
/// counting the delimiters between them.
fn fit_passages(passages: &[String], max_context_chars: usize) -> usize {
    let mut used = 0usize;
    let mut kept = 0usize;
    for passage in passages {
        let cost = passage.chars().count()
            + if kept > 0 {
                PASSAGE_DELIMITER.len()
            } else {
                0
            };
        if used + cost > max_context_chars {
            break;
        }
        used += cost;
        kept += 1;
    }
    kept
}

fn build_prompt(question: &str, passages: &[String]) -> String {
    let context = passages.join(PASSAGE_DELIMITER);
    format!("{INSTRUCTION}\n\nContext:\n{context}\n\nQuestion:\n{question}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCompleter {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CompletionModel for CountingCompleter {
        fn model_id(&self) -> &str {
            "counting"
        }

        async fn complete(&self, prompt: &str) -> docqa_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model unavailable");
            }
            Ok(prompt.to_owned())
        }
    }

    fn synthesizer(fail: bool) -> (Synthesizer<CountingCompleter>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let completer = CountingCompleter {
            calls: Arc::clone(&calls),
            fail,
        };
        (Synthesizer::new(completer), calls)
    }

    #[tokio::test]
    async fn empty_passages_short_circuit_to_sentinel() {
        let (synth, calls) = synthesizer(false);
        let answer = synth.answer("anything?", &[], 4000).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn prompt_contains_context_and_question() {
        let (synth, _) = synthesizer(false);
        let passages = vec!["first passage".to_owned(), "second passage".to_owned()];
        let prompt = synth
            .answer("What is this?", &passages, 4000)
            .await
            .unwrap();
        assert!(prompt.contains("first passage\n\nsecond passage"));
        assert!(prompt.contains("Question:\nWhat is this?"));
        assert!(prompt.contains("Use only the context below"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[tokio::test]
    async fn budget_drops_lowest_relevance_passages_whole() {
        let (synth, _) = synthesizer(false);
        let passages = vec!["a".repeat(30), "b".repeat(30), "c".repeat(30)];
        // Budget fits the first two passages plus one delimiter, not the
        // third.
        let prompt = synth.answer("q", &passages, 70).await.unwrap();
        assert!(prompt.contains(&"a".repeat(30)));
        assert!(prompt.contains(&"b".repeat(30)));
        assert!(!prompt.contains(&"c".repeat(30)));
        // Nothing got truncated mid-passage: no stray prefix of the dropped
        // passage appears after the kept context.
        assert!(!prompt.contains(&format!("{}\n\nc", "b".repeat(30))));
    }

    #[tokio::test]
    async fn nothing_fits_returns_sentinel_without_model_call() {
        let (synth, calls) = synthesizer(false);
        let passages = vec!["far too long for this budget".to_owned()];
        let answer = synth.answer("q", &passages, 10).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn completion_failure_becomes_synthesis_error() {
        let (synth, _) = synthesizer(true);
        let passages = vec!["context".to_owned()];
        let err = synth.answer("q", &passages, 4000).await.unwrap_err();
        assert!(matches!(err, RagError::Synthesis(_)));
    }

    #[test]
    fn fit_passages_counts_delimiters() {
        let passages = vec!["aaaa".to_owned(), "bbbb".to_owned()];
        // 4 + 2 + 4 = 10.
        assert_eq!(fit_passages(&passages, 10), 2);
        assert_eq!(fit_passages(&passages, 9), 1);
        assert_eq!(fit_passages(&passages, 3), 0);
    }
}
