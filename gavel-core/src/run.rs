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

//! Run records: verdicts, per-case results, and the finished run payload.

use crate::test_case::{Hyperparameters, TestCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of scoring one metric against one test case.
///
/// A verdict either carries a normalized score with the judge's reasoning,
/// or a metric-level error when the judge reply could not be used. An
/// errored verdict never passes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricVerdict {
    /// Metric name, e.g. `Correctness`
    pub name: String,

    /// Normalized score in `[0, 1]`, absent when scoring errored
    pub score: Option<f64>,

    /// Judge's justification for the score
    pub reason: Option<String>,

    /// Whether the score met the threshold
    pub passed: bool,

    /// Pass threshold the score was compared against
    pub threshold: f64,

    /// Scoring error, when the judge reply was unusable
    pub error: Option<String>,
}

impl MetricVerdict {
    /// Verdict for a successfully scored metric. Scores equal to the
    /// threshold pass.
    pub fn scored(
        name: impl Into<String>,
        score: f64,
        reason: impl Into<String>,
        threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            score: Some(score),
            reason: Some(reason.into()),
            passed: score >= threshold,
            threshold,
            error: None,
        }
    }

    /// Verdict for a metric whose scoring failed.
    pub fn errored(name: impl Into<String>, threshold: f64, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            score: None,
            reason: None,
            passed: false,
            threshold,
            error: Some(error.into()),
        }
    }
}

/// A test case together with the verdicts every metric produced for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseRecord {
    /// The evaluated test case
    pub case: TestCase,

    /// One verdict per metric, in battery order
    pub verdicts: Vec<MetricVerdict>,
}

impl CaseRecord {
    /// Create a case record
    pub fn new(case: TestCase, verdicts: Vec<MetricVerdict>) -> Self {
        Self { case, verdicts }
    }

    /// Whether every verdict for this case passed
    pub fn all_passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }
}

/// A finished evaluation run, ready for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    /// Unique run identifier
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Metadata describing what was evaluated and with which judge
    pub hyperparameters: Hyperparameters,

    /// Scored cases in dataset order
    pub cases: Vec<CaseRecord>,

    /// Wall-clock duration of the scoring phase
    pub duration_ms: u64,
}

impl TestRun {
    /// Start an empty run record
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            hyperparameters,
            cases: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Append a scored case
    pub fn add_case(&mut self, record: CaseRecord) {
        self.cases.push(record);
    }

    /// Total number of verdicts across all cases
    pub fn verdict_count(&self) -> usize {
        self.cases.iter().map(|c| c.verdicts.len()).sum()
    }

    /// Number of passing verdicts
    pub fn passed_count(&self) -> usize {
        self.cases
            .iter()
            .map(|c| c.verdicts.iter().filter(|v| v.passed).count())
            .sum()
    }

    /// Number of failing verdicts, errored verdicts included
    pub fn failed_count(&self) -> usize {
        self.verdict_count() - self.passed_count()
    }

    /// Fraction of verdicts that passed, `0.0` for an empty run
    pub fn pass_rate(&self) -> f64 {
        let total = self.verdict_count();
        if total == 0 {
            return 0.0;
        }
        self.passed_count() as f64 / total as f64
    }
}

/// Where the finished run's report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportDelivery {
    /// Published to the remote scoreboard
    Remote {
        /// Browse link returned by the scoreboard, when it sent one
        link: Option<String>,
    },
    /// Rendered locally only
    Local,
}

/// Condensed result of a finished run, returned to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Where the report was delivered
    pub delivery: ReportDelivery,

    /// Total verdicts in the run
    pub total_verdicts: usize,

    /// Verdicts that passed
    pub passed: usize,

    /// Verdicts that failed or errored
    pub failed: usize,
}

impl RunSummary {
    /// Summary of a run that evaluated nothing
    pub fn empty() -> Self {
        Self {
            delivery: ReportDelivery::Local,
            total_verdicts: 0,
            passed: 0,
            failed: 0,
        }
    }

    /// Summarize a finished run
    pub fn from_run(run: &TestRun, delivery: ReportDelivery) -> Self {
        Self {
            delivery,
            total_verdicts: run.verdict_count(),
            passed: run.passed_count(),
            failed: run.failed_count(),
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let delivery = match &self.delivery {
            ReportDelivery::Remote { link: Some(link) } => format!("remote ({})", link),
            ReportDelivery::Remote { link: None } => "remote".to_string(),
            ReportDelivery::Local => "local".to_string(),
        };
        write!(
            f,
            "{}/{} verdicts passed, {} failed, report: {}",
            self.passed, self.total_verdicts, self.failed, delivery
        )
    }
}
