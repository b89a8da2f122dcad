//! GeminiGenerationService - Gemini REST API as the LaTeX generator.
//!
//! Calls `models/<model>:generateContent` directly and asks for a JSON reply
//! (see [`crate::prompts`]).

use crate::prompts::{initial_prompt, parse_reply, refine_prompt};
use async_trait::async_trait;
use quire_core::config::GenerationConfig;
use quire_core::conversation::ConversationTurn;
use quire_core::error::{QuireError, Result};
use quire_core::generation::{GeneratedDocument, GenerationService};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Environment variables checked, in order, when the config has no key.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GOOGLE_GENAI_API_KEY", "GEMINI_API_KEY"];

#[derive(Clone)]
pub struct GeminiGenerationService {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerationService {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Builds the service from the `[generation]` section, falling back to
    /// the environment for the API key.
    ///
    /// # Errors
    ///
    /// Returns `QuireError::Config` when no API key is configured anywhere.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                API_KEY_ENV_VARS
                    .iter()
                    .find_map(|name| std::env::var(name).ok().filter(|key| !key.trim().is_empty()))
            })
            .ok_or_else(|| {
                QuireError::config(format!(
                    "No Gemini API key: set [generation] api_key or {}",
                    API_KEY_ENV_VARS.join(" / ")
                ))
            })?;

        Ok(Self::new(api_key, config.model.clone()))
    }

    /// Overrides the API root, e.g. to point at a proxy.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_request(&self, prompt: String) -> Result<String> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationSettings {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|err| QuireError::generation(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, &body_text));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|err| {
            QuireError::generation(format!("Failed to parse Gemini response: {err}"))
        })?;

        extract_text_response(parsed)
    }
}

#[async_trait]
impl GenerationService for GeminiGenerationService {
    async fn generate_initial(&self, instruction: &str) -> Result<GeneratedDocument> {
        tracing::debug!(model = %self.model, "Requesting initial document");
        let text = self.send_request(initial_prompt(instruction)).await?;
        parse_reply(&text)
    }

    async fn refine(
        &self,
        body: &str,
        history: &[ConversationTurn],
        instruction: &str,
    ) -> Result<GeneratedDocument> {
        tracing::debug!(model = %self.model, turns = history.len(), "Requesting refinement");
        let text = self
            .send_request(refine_prompt(body, history, instruction))
            .await?;
        parse_reply(&text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text_response(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| QuireError::generation("Gemini API returned no text in the response candidates"))
}

fn map_http_error(status: StatusCode, body: &str) -> QuireError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.to_string());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.to_string());

    QuireError::generation(format!("Gemini API error ({}): {message}", status.as_u16()))
}
