//! Blocking Gemini REST client.
//!
//! Uses the `generateContent` endpoint of the Generative Language API. The
//! API key is sent in the `x-goog-api-key` header.

use super::{GenerateRequest, GenerationError, Generator};
use crate::project::Settings;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Base URL of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variable consulted when the project stores no API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Per-request timeout. Long prompts can take minutes.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Normalize a model identifier to its resource path (`models/<id>`).
pub fn model_path(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

// ============================================================================
// API Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cached_content: Option<&'a str>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub(crate) struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub(crate) fn user_text(text: &str) -> Self {
        Self {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    if let Some(reason) = response
        .prompt_feedback
        .and_then(|feedback| feedback.block_reason)
    {
        return Err(GenerationError::EmptyResponse(format!(
            "prompt blocked ({})",
            reason
        )));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(GenerationError::EmptyResponse(
            "no candidates returned".to_string(),
        ));
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.is_empty() {
        let reason = candidate
            .finish_reason
            .unwrap_or_else(|| "unknown".to_string());
        return Err(GenerationError::EmptyResponse(format!(
            "finish reason {}",
            reason
        )));
    }

    Ok(text)
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    /// Create a client for the public endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;
        Ok(Self::from_parts(api_key, DEFAULT_BASE_URL, http))
    }

    /// Create a client from explicit parts.
    pub fn from_parts(api_key: impl Into<String>, base_url: impl Into<String>, http: Client) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client using the project's API key, falling back to `GEMINI_API_KEY`.
    pub fn from_settings(settings: &Settings) -> Result<Self, GenerationError> {
        let api_key = match settings.api_key() {
            Some(key) => key.to_string(),
            None => std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .ok_or(GenerationError::MissingApiKey)?,
        };
        Self::new(api_key)
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.url(path)))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.post(self.url(path)))
    }

    pub(crate) fn patch(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.patch(self.url(path)))
    }

    pub(crate) fn delete(&self, path: &str) -> RequestBuilder {
        self.authorized(self.http.delete(self.url(path)))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("x-goog-api-key", &self.api_key)
    }

    /// Send a request and decode a JSON success body.
    pub(crate) fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, GenerationError> {
        let response = Self::check_status(builder.send()?)?;
        Ok(response.json()?)
    }

    /// Send a request whose success body is ignored.
    pub(crate) fn send_empty(&self, builder: RequestBuilder) -> Result<(), GenerationError> {
        Self::check_status(builder.send()?)?;
        Ok(())
    }

    fn check_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .ok()
            .filter(|message| !message.is_empty())
            .unwrap_or(body);

        Err(GenerationError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl Generator for GeminiClient {
    fn generate(&self, request: &GenerateRequest) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: vec![Content::user_text(&request.prompt)],
            cached_content: request.cached_content.as_deref(),
        };
        let path = format!("{}:generateContent", model_path(&request.model));
        let response: GenerateContentResponse = self.send_json(self.post(&path).json(&body))?;
        extract_text(response)
    }
}
