//! Generation API boundary.
//!
//! The executor only needs one capability: turn a prompt into text. That
//! capability is the [`Generator`] trait. Production runs use
//! [`GeminiClient`]; tests and dry runs pass closures or [`EchoGenerator`].
//!
//! - **gemini**: blocking REST client for `generateContent`
//! - **cache**: server-side cached content management (`cachedContents`)

pub mod cache;
mod gemini;

pub use gemini::{API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, GeminiClient, model_path};

use thiserror::Error;

/// A single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Fully resolved prompt text.
    pub prompt: String,
    /// Model identifier, with or without the `models/` prefix.
    pub model: String,
    /// Optional cached content name (`cachedContents/...`) to attach.
    pub cached_content: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            cached_content: None,
        }
    }

    pub fn with_cached_content(mut self, cached_content: Option<String>) -> Self {
        self.cached_content = cached_content;
        self
    }
}

/// Failure surfaced by the generation service. Opaque to the executor.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// No API key in the project settings or the environment.
    #[error("no API key configured (set {} or settings.api_key)", API_KEY_ENV)]
    MissingApiKey,

    /// Transport failure: connection, TLS, timeout, or undecodable body.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered but produced no text (e.g. a blocked prompt).
    #[error("response contained no text: {0}")]
    EmptyResponse(String),

    #[error("{0}")]
    Other(String),
}

/// Turns a prompt into generated text.
pub trait Generator: Send + Sync {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError>;
}

impl<F> Generator for F
where
    F: Fn(&GenerateRequest) -> Result<String, GenerationError> + Send + Sync,
{
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        self(request)
    }
}

/// Returns the prompt unchanged. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl Generator for EchoGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        Ok(request.prompt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_generator() {
        let generator = |req: &GenerateRequest| -> Result<String, GenerationError> {
            Ok(format!("{}:{}", req.model, req.prompt))
        };
        let out = generator
            .generate(&GenerateRequest::new("hi", "m"))
            .unwrap();
        assert_eq!(out, "m:hi");
    }

    #[test]
    fn test_echo_generator() {
        let req = GenerateRequest::new("same text", "model")
            .with_cached_content(Some("cachedContents/abc".to_string()));
        assert_eq!(EchoGenerator.generate(&req).unwrap(), "same text");
    }

    #[test]
    fn test_error_display() {
        let err = GenerationError::Api {
            status: 429,
            message: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "API error 429: quota exceeded");
        assert!(
            GenerationError::MissingApiKey
                .to_string()
                .contains("GEMINI_API_KEY")
        );
    }
}
