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

//! Shipped metric batteries.
//!
//! Each builder returns a fixed battery bound to one shared judge. Names,
//! criteria, parameter sets, thresholds, and ordering are stable across
//! rebuilds, so scores stay comparable between runs.

use crate::geval::GEvalMetric;
use crate::judge::JudgeModel;
use gavel_core::{EvalParam, Hyperparameters};
use std::path::PathBuf;
use std::sync::Arc;

/// Suite identifier for requirement analysis evaluations
pub const REQUIREMENT_SUITE: &str = "requirement_analysis_v1";

/// Suite identifier for test-cases table evaluations
pub const TABLE_OUTPUT_SUITE: &str = "test_cases_table_output_v1";

/// Suite identifier for the single-case smoke evaluation
pub const SMOKE_SUITE: &str = "smoke_v1";

fn correctness_metric(judge: Arc<dyn JudgeModel>) -> GEvalMetric {
    GEvalMetric::new(
        "Correctness",
        "Determine if the 'actual output' is correct based on the 'expected output'.",
        vec![EvalParam::ActualOutput, EvalParam::ExpectedOutput],
        judge,
    )
}

/// The nine-metric battery for requirement analysis outputs.
pub fn requirement_metrics(judge: Arc<dyn JudgeModel>) -> Vec<GEvalMetric> {
    vec![
        correctness_metric(judge.clone()),
        GEvalMetric::new(
            "Clarity",
            "Assess how clear and understandable the actual output is. Evaluate linguistic \
             complexity, readability, and how easy it is to comprehend the message.",
            vec![EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Relevance",
            "Ensure the actual output is relevant to the input question. Evaluate how well \
             the response aligns with what was asked and addresses the user's concerns.",
            vec![EvalParam::Input, EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Completeness",
            "Check if the actual output covers all necessary aspects to fully answer the \
             input question. Identify any missing elements or gaps in the response.",
            vec![EvalParam::Input, EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Consistency",
            "Evaluate the consistency in language, tone, and format in the actual output. \
             Assess uniformity in style and terminology throughout the response.",
            vec![EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Actionability",
            "Determine if the actual output leads to actionable steps or insights. Evaluate \
             whether users can take meaningful actions based on the information provided.",
            vec![EvalParam::Input, EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Accuracy",
            "Validate the accuracy of the actual output by comparing it with the expected \
             output. Look for any errors, misinterpretations, or factual inaccuracies.",
            vec![EvalParam::ActualOutput, EvalParam::ExpectedOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Efficiency",
            "Consider whether the actual output is concise and efficient in conveying \
             information. Evaluate if the response avoids unnecessary verbosity while \
             maintaining completeness.",
            vec![EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Bias and Fairness",
            "Check for any biases or unfair assumptions in the actual output. Evaluate \
             sentiment, neutrality, and whether the response treats all groups fairly \
             without discrimination.",
            vec![EvalParam::ActualOutput],
            judge,
        ),
    ]
}

/// The three-metric battery for markdown test-cases tables.
pub fn table_output_metrics(judge: Arc<dyn JudgeModel>) -> Vec<GEvalMetric> {
    vec![
        GEvalMetric::new(
            "Table Format",
            "Confirm the actual output is a well-formed markdown table with the required \
             headings TC-ID, Description, Type, Expected Outcome, Reference.",
            vec![EvalParam::ActualOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Content Alignment",
            "Check that the actual output covers both positive and negative scenarios using \
             equivalence partitioning and boundary analysis details as described in the \
             expected output.",
            vec![EvalParam::ActualOutput, EvalParam::ExpectedOutput],
            judge.clone(),
        ),
        GEvalMetric::new(
            "Completeness",
            "Ensure each table row contains a filled TC-ID, Description, Type, Expected \
             Outcome, and Reference.",
            vec![EvalParam::ActualOutput],
            judge,
        ),
    ]
}

/// The single-metric battery used by the smoke suite.
pub fn smoke_metrics(judge: Arc<dyn JudgeModel>) -> Vec<GEvalMetric> {
    vec![correctness_metric(judge)]
}

/// Compose the metadata recorded with a suite run.
pub fn build_hyperparameters(
    suite: &str,
    prompt_asset: impl Into<PathBuf>,
    judge: &dyn JudgeModel,
) -> Hyperparameters {
    Hyperparameters::new(suite, judge.model_name(), prompt_asset)
}
