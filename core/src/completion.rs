//! Text completion capability.

use core::future::Future;

/// Produces a text completion for a prompt.
///
/// This is the capability the answer synthesizer invokes once it has
/// assembled a prompt from retrieved context. Implementations are expected to
/// be blocking-in-spirit I/O (a network call or local inference) wrapped in a
/// future; they do not need to support cancellation mid-call.
pub trait CompletionModel: Send + Sync {
    /// Returns a stable identifier for the underlying model.
    fn model_id(&self) -> &str;

    /// Completes the given prompt, returning the model's raw text output.
    fn complete(&self, prompt: &str) -> impl Future<Output = crate::Result<String>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoModel;

    impl CompletionModel for EchoModel {
        fn model_id(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> crate::Result<String> {
            Ok(prompt.to_owned())
        }
    }

    #[tokio::test]
    async fn complete_returns_output() {
        let model = EchoModel;
        let out = model.complete("say hi").await.unwrap();
        assert_eq!(out, "say hi");
    }
}
