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

//! # Gavel Evaluation Harness
//!
//! LLM-as-judge scoring for AI application outputs, built to produce a
//! verdict for every case even when the network, the judge, or the
//! reporting backend is unavailable.
//!
//! ## Features
//!
//! - **Judge adapters**: Anthropic and Gemini chat APIs behind one trait,
//!   degrading to deterministic offline replies without credentials
//! - **Rubric metrics**: two-phase criteria scoring with tolerant reply
//!   parsing and metric-level error recording
//! - **Suite batteries**: fixed metric sets whose composition is stable
//!   across rebuilds
//! - **Resilient reporting**: scoreboard uploads that degrade to local
//!   reports when the scoreboard response carries no run identifier
//!
//! ## Example
//!
//! ```rust,ignore
//! use gavel_evals::{evaluate, suites, ClaudeJudge, TestRunManager};
//! use gavel_core::TestCase;
//! use std::sync::Arc;
//!
//! let judge = Arc::new(ClaudeJudge::from_env());
//! let metrics = suites::requirement_metrics(judge.clone());
//! let hyperparameters = suites::build_hyperparameters(
//!     suites::REQUIREMENT_SUITE,
//!     "prompts/requirement_analysis.md",
//!     judge.as_ref(),
//! );
//!
//! let manager = TestRunManager::local_only();
//! let cases = vec![TestCase::new("input", "actual", "expected")];
//! let summary = evaluate(&manager, cases, metrics, hyperparameters).await?;
//! println!("{}", summary);
//! ```

use thiserror::Error;

pub mod config;
pub mod dataset;
pub mod geval;
pub mod judge;
pub mod prompt;
pub mod report;
pub mod run_manager;
pub mod runner;
pub mod schema;
pub mod suites;

pub use config::{ConfigError, Credentials};
pub use dataset::{load_test_cases, DatasetError};
pub use geval::{GEvalMetric, DEFAULT_THRESHOLD};
pub use judge::{
    ClaudeJudge, GeminiJudge, JudgeModel, DEFAULT_CLAUDE_MODEL, DEFAULT_GEMINI_MODEL,
};
pub use prompt::{read_prompt, PromptError};
pub use report::{
    render_local_report, PublishedRun, ReportError, ReportSink, ScoreboardClient,
    DEFAULT_SCOREBOARD_URL,
};
pub use run_manager::TestRunManager;
pub use runner::{evaluate, evaluate_with_config};
pub use schema::{offline_reply, ReasonScore, ResponseShape, Steps};
pub use suites::{
    build_hyperparameters, requirement_metrics, smoke_metrics, table_output_metrics,
    REQUIREMENT_SUITE, SMOKE_SUITE, TABLE_OUTPUT_SUITE,
};

/// Errors that can occur while scoring a single metric.
///
/// These never abort a run; they are recorded on the affected verdict.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Malformed judge reply: {0}")]
    MalformedReply(String),

    #[error("Evaluation timeout")]
    Timeout,
}

/// Configuration for evaluation runs.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Maximum number of cases scored concurrently
    pub max_concurrent: usize,

    /// Per-metric scoring timeout in seconds, covering both judge calls
    pub metric_timeout_secs: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            metric_timeout_secs: 180,
        }
    }
}
