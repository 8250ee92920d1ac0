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

//! Run reporting: the remote scoreboard client and the local renderer.

use async_trait::async_trait;
use gavel_core::TestRun;
use std::time::Duration;
use thiserror::Error;

/// Default scoreboard endpoint, overridable via `GAVEL_SCOREBOARD_URL`
pub const DEFAULT_SCOREBOARD_URL: &str = "https://scoreboard.gavel.dev";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from publishing a run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The scoreboard accepted the request but the response carried no run
    /// identifier. This is the one failure the run manager degrades on.
    #[error("scoreboard response missing 'id'")]
    MissingRunId,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Acknowledgement a sink returns for a published run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedRun {
    /// Identifier the scoreboard assigned
    pub id: String,

    /// Browse link for the published run, when the scoreboard sent one
    pub link: Option<String>,
}

/// Remote destination for finished runs.
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Publish a finished run and return the remote acknowledgement
    async fn publish(&self, run: &TestRun) -> Result<PublishedRun, ReportError>;
}

/// HTTP client for the gavel scoreboard service.
pub struct ScoreboardClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ScoreboardClient {
    /// Create a client against [`DEFAULT_SCOREBOARD_URL`]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_SCOREBOARD_URL.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("failed to construct HTTP client"),
        }
    }

    /// Override the scoreboard base URL (for testing)
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl ReportSink for ScoreboardClient {
    async fn publish(&self, run: &TestRun) -> Result<PublishedRun, ReportError> {
        let response = self
            .client
            .post(format!("{}/v1/runs", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(run)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(ReportError::ApiError(error_text));
        }

        let body: serde_json::Value = response.json().await?;

        let id = body["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or(ReportError::MissingRunId)?;
        let link = body["link"].as_str().map(|s| s.to_string());

        Ok(PublishedRun { id, link })
    }
}

/// Render a finished run as a plain-text report.
pub fn render_local_report(run: &TestRun) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "Evaluation run {} (suite: {}, judge: {})\n",
        run.run_id, run.hyperparameters.suite, run.hyperparameters.judge_model
    ));

    for (index, record) in run.cases.iter().enumerate() {
        let case_marker = if record.all_passed() { "✓" } else { "✗" };
        out.push_str(&format!(
            "\nCase {} {}: {}\n",
            index + 1,
            case_marker,
            record.case.input
        ));
        for verdict in &record.verdicts {
            let marker = if verdict.passed { "✓" } else { "✗" };
            match (verdict.score, &verdict.error) {
                (Some(score), _) => {
                    out.push_str(&format!(
                        "  {} {} score={:.2} (threshold {:.2})\n",
                        marker, verdict.name, score, verdict.threshold
                    ));
                    if let Some(reason) = &verdict.reason {
                        out.push_str(&format!("      {}\n", reason));
                    }
                }
                (None, Some(error)) => {
                    out.push_str(&format!("  {} {} error: {}\n", marker, verdict.name, error));
                }
                (None, None) => {
                    out.push_str(&format!("  {} {} (no score)\n", marker, verdict.name));
                }
            }
        }
    }

    out.push_str(&format!(
        "\nTotals: {}/{} verdicts passed, {} failed ({} ms)\n",
        run.passed_count(),
        run.verdict_count(),
        run.failed_count(),
        run.duration_ms
    ));

    out
}
