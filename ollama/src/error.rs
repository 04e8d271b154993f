use thiserror::Error;

/// Errors raised by the Ollama HTTP backend.
#[derive(Debug, Error)]
pub enum OllamaError {
    /// The server could not be reached or the request failed in transit.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("ollama returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body of the error response, if any.
        message: String,
    },
    /// The response body did not have the expected shape.
    #[error("unexpected response payload: {0}")]
    Payload(String),
}
