//! Ollama-backed embedding and completion capabilities.
//!
//! Talks to a local [Ollama](https://ollama.com) server over its HTTP API:
//! `/api/embeddings` for vectors and `/api/generate` (non-streaming) for
//! completions. One [`Ollama`] value implements both `docqa-core`
//! capabilities, each bound to its own model name.
//!
//! ```no_run
//! use docqa_ollama::Ollama;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ollama = Ollama::builder()
//!     .base_url("http://localhost:11434")
//!     .completion_model("mistral")
//!     .embedding_model("nomic-embed-text")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use docqa_core::{CompletionModel, Embedding, EmbeddingModel};
use serde::{Deserialize, Serialize};

mod error;

pub use error::OllamaError;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_COMPLETION_MODEL: &str = "mistral";
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";
const DEFAULT_EMBEDDING_DIM: usize = 768;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Extracts the `error` field from an Ollama error body, falling back to the
/// raw text when the body is not the usual JSON shape.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body).map_or_else(|_| body.to_owned(), |e| e.error)
}

/// Client for a local Ollama server, usable as both an embedding and a
/// completion capability.
#[derive(Debug, Clone)]
pub struct Ollama {
    client: reqwest::Client,
    base_url: String,
    completion_model: String,
    embedding_model: String,
    embedding_dim: usize,
}

impl Ollama {
    /// Creates a builder with the default local endpoint and models.
    #[must_use]
    pub fn builder() -> OllamaBuilder {
        OllamaBuilder::new()
    }

    /// Connects to `http://localhost:11434` with the default models.
    ///
    /// # Errors
    /// [`OllamaError::Http`] if the HTTP client cannot be constructed.
    pub fn local() -> Result<Self, OllamaError> {
        Self::builder().build()
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, OllamaError>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| OllamaError::Payload(e.to_string()))
    }

    async fn embed_text(&self, text: &str) -> Result<Embedding, OllamaError> {
        let request = EmbeddingRequest {
            model: &self.embedding_model,
            prompt: text,
        };
        let response: EmbeddingResponse = self.post("/api/embeddings", &request).await?;

        if response.embedding.len() != self.embedding_dim {
            return Err(OllamaError::Payload(format!(
                "model {} returned a {}-dimensional vector, expected {}",
                self.embedding_model,
                response.embedding.len(),
                self.embedding_dim
            )));
        }
        Ok(response.embedding)
    }

    async fn generate(&self, prompt: &str) -> Result<String, OllamaError> {
        let request = GenerateRequest {
            model: &self.completion_model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse = self.post("/api/generate", &request).await?;
        Ok(response.response)
    }
}

impl EmbeddingModel for Ollama {
    fn dim(&self) -> usize {
        self.embedding_dim
    }

    fn model_id(&self) -> &str {
        &self.embedding_model
    }

    async fn embed(&self, text: &str) -> docqa_core::Result<Embedding> {
        tracing::trace!(model = %self.embedding_model, chars = text.len(), "embedding request");
        Ok(self.embed_text(text).await?)
    }
}

impl CompletionModel for Ollama {
    fn model_id(&self) -> &str {
        &self.completion_model
    }

    async fn complete(&self, prompt: &str) -> docqa_core::Result<String> {
        tracing::trace!(model = %self.completion_model, chars = prompt.len(), "completion request");
        Ok(self.generate(prompt).await?)
    }
}

/// Builder for [`Ollama`].
#[derive(Debug, Clone)]
pub struct OllamaBuilder {
    base_url: String,
    completion_model: String,
    embedding_model: String,
    embedding_dim: usize,
    timeout: Duration,
}

impl Default for OllamaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaBuilder {
    /// Creates a builder with the default local endpoint and models.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            completion_model: DEFAULT_COMPLETION_MODEL.to_owned(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_owned(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the server base URL. A trailing slash is stripped.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.strip_suffix('/').map_or(url.clone(), str::to_owned);
        self
    }

    /// Sets the model used for completions.
    #[must_use]
    pub fn completion_model(mut self, model: impl Into<String>) -> Self {
        self.completion_model = model.into();
        self
    }

    /// Sets the model used for embeddings.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    /// Sets the expected embedding dimensionality. Responses with a different
    /// length are rejected rather than silently indexed.
    #[must_use]
    pub const fn embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    /// [`OllamaError::Http`] if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<Ollama, OllamaError> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        Ok(Ollama {
            client,
            base_url: self.base_url,
            completion_model: self.completion_model,
            embedding_model: self.embedding_model,
            embedding_dim: self.embedding_dim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let ollama = Ollama::local().unwrap();
        assert_eq!(ollama.base_url, "http://localhost:11434");
        assert_eq!(CompletionModel::model_id(&ollama), "mistral");
        assert_eq!(EmbeddingModel::model_id(&ollama), "nomic-embed-text");
        assert_eq!(ollama.dim(), 768);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let ollama = Ollama::builder()
            .base_url("http://10.0.0.2:11434/")
            .build()
            .unwrap();
        assert_eq!(ollama.base_url, "http://10.0.0.2:11434");
    }

    #[test]
    fn api_error_body_is_unwrapped() {
        assert_eq!(
            api_error_message(r#"{"error":"model 'mistral' not found"}"#),
            "model 'mistral' not found"
        );
    }

    #[test]
    fn non_json_error_body_is_passed_through() {
        assert_eq!(api_error_message("502 Bad Gateway"), "502 Bad Gateway");
        assert_eq!(api_error_message(""), "");
    }

    #[test]
    fn identity_reflects_configuration() {
        let ollama = Ollama::builder()
            .embedding_model("mxbai-embed-large")
            .embedding_dim(1024)
            .build()
            .unwrap();
        let identity = ollama.identity();
        assert_eq!(identity.model, "mxbai-embed-large");
        assert_eq!(identity.dim, 1024);
    }
}
