// Copyright 2025 Gavel Contributors (https://github.com/gavel-evals)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Judge model adapters.
//!
//! Each adapter wraps one remote chat API behind [`JudgeModel`]. A judge
//! constructed without credentials, or whose single remote attempt fails
//! for any reason, answers with the deterministic offline reply for the
//! requested shape instead of surfacing an error. Scoring therefore runs
//! to completion on machines with no network access and no keys.

use crate::schema::{offline_reply, ResponseShape};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Default Anthropic judge model
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-3-5-haiku-20241022";

/// Default Gemini judge model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-flash-preview";

const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Errors from a single judge API call.
///
/// These never escape the adapters; they are folded into the offline
/// fallback. The enum exists so the failure can be logged with its cause.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A model that answers scoring prompts.
#[async_trait]
pub trait JudgeModel: Send + Sync {
    /// Name of the underlying model, recorded in run metadata
    fn model_name(&self) -> &str;

    /// Send a prompt and return the reply text.
    ///
    /// Makes at most one remote attempt. Any failure, including missing
    /// credentials, timeouts, and malformed response bodies, yields the
    /// offline reply for `shape`. Callers never observe an error.
    async fn generate(&self, prompt: &str, shape: Option<ResponseShape>) -> String;

    /// Scheduler-facing entry point, identical to [`generate`](Self::generate).
    async fn generate_async(&self, prompt: &str, shape: Option<ResponseShape>) -> String {
        self.generate(prompt, shape).await
    }
}

/// Judge backed by the Anthropic messages API.
pub struct ClaudeJudge {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl ClaudeJudge {
    /// Create a judge using [`DEFAULT_CLAUDE_MODEL`]. Pass `None` to run
    /// fully offline.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_model(api_key, DEFAULT_CLAUDE_MODEL)
    }

    /// Create a judge for a specific model
    pub fn with_model(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            client: http_client(),
        }
    }

    /// Read the API key from `ANTHROPIC_API_KEY`
    pub fn from_env() -> Self {
        Self::new(std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty()))
    }

    /// Override the API base URL (for testing)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Whether this judge will answer from the offline fallback
    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    async fn request_completion(&self, api_key: &str, prompt: &str) -> Result<String, JudgeError> {
        let request = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(JudgeError::ApiError(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;

        response_data["content"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| JudgeError::InvalidResponse("no text in first content block".to_string()))
    }
}

#[async_trait]
impl JudgeModel for ClaudeJudge {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, shape: Option<ResponseShape>) -> String {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return offline_reply(shape),
        };

        match self.request_completion(api_key, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Judge call to {} failed ({}), using offline reply", self.model, e);
                offline_reply(shape)
            }
        }
    }
}

/// Judge backed by the Gemini generateContent API.
pub struct GeminiJudge {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiJudge {
    /// Create a judge using [`DEFAULT_GEMINI_MODEL`]. Pass `None` to run
    /// fully offline.
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_model(api_key, DEFAULT_GEMINI_MODEL)
    }

    /// Create a judge for a specific model
    pub fn with_model(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_key,
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            client: http_client(),
        }
    }

    /// Read the API key from `GEMINI_API_KEY`
    pub fn from_env() -> Self {
        Self::new(std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()))
    }

    /// Override the API base URL (for testing)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Whether this judge will answer from the offline fallback
    pub fn is_offline(&self) -> bool {
        self.api_key.is_none()
    }

    async fn request_completion(&self, api_key: &str, prompt: &str) -> Result<String, JudgeError> {
        let request = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": prompt
                        }
                    ]
                }
            ]
        });

        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(JudgeError::ApiError(error_text));
        }

        let response_data: serde_json::Value = response.json().await?;

        response_data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| JudgeError::InvalidResponse("no text in first candidate".to_string()))
    }
}

#[async_trait]
impl JudgeModel for GeminiJudge {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, shape: Option<ResponseShape>) -> String {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => return offline_reply(shape),
        };

        match self.request_completion(api_key, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Judge call to {} failed ({}), using offline reply", self.model, e);
                offline_reply(shape)
            }
        }
    }
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .expect("failed to construct HTTP client")
}
