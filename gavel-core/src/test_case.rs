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

//! Test cases and run metadata shared across the harness.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single evaluation test case.
///
/// Holds the prompt the application under test received, the output it
/// produced, and the reference output the judge compares against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestCase {
    /// What the application was asked
    pub input: String,

    /// What the application produced
    pub actual_output: String,

    /// The reference answer
    pub expected_output: String,
}

impl TestCase {
    /// Create a new test case
    pub fn new(
        input: impl Into<String>,
        actual_output: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            actual_output: actual_output.into(),
            expected_output: expected_output.into(),
        }
    }

    /// Select the field a metric parameter refers to.
    pub fn field(&self, param: EvalParam) -> &str {
        match param {
            EvalParam::Input => &self.input,
            EvalParam::ActualOutput => &self.actual_output,
            EvalParam::ExpectedOutput => &self.expected_output,
        }
    }
}

/// Test case fields a metric can read when scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalParam {
    /// The application's input prompt
    Input,
    /// The application's produced output
    ActualOutput,
    /// The reference output
    ExpectedOutput,
}

impl EvalParam {
    /// Stable identifier for logs and serialized metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            EvalParam::Input => "input",
            EvalParam::ActualOutput => "actual_output",
            EvalParam::ExpectedOutput => "expected_output",
        }
    }

    /// Heading used when the field is rendered into a scoring prompt
    pub fn label(&self) -> &'static str {
        match self {
            EvalParam::Input => "INPUT (what the application was asked)",
            EvalParam::ActualOutput => "ACTUAL OUTPUT (what the application produced)",
            EvalParam::ExpectedOutput => "EXPECTED OUTPUT (the reference answer)",
        }
    }
}

/// Metadata recorded with every run so results can be compared across
/// suite and judge revisions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hyperparameters {
    /// Suite identifier, e.g. `requirement_analysis_v1`
    pub suite: String,

    /// Judge model that scored the run
    pub judge_model: String,

    /// Path of the prompt asset the application under test was driven with
    pub prompt_asset: PathBuf,
}

impl Hyperparameters {
    /// Create run metadata
    pub fn new(
        suite: impl Into<String>,
        judge_model: impl Into<String>,
        prompt_asset: impl Into<PathBuf>,
    ) -> Self {
        Self {
            suite: suite.into(),
            judge_model: judge_model.into(),
            prompt_asset: prompt_asset.into(),
        }
    }
}
