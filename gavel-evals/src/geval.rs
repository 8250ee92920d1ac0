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

//! Rubric-driven metric scoring.
//!
//! A [`GEvalMetric`] scores a test case in two judge calls: the first
//! derives ordered evaluation steps from the metric's criteria, the second
//! applies those steps to the case fields and returns a 0-10 score with a
//! justification. Raw scores are normalized into `[0, 1]` and compared
//! against the metric's threshold.
//!
//! Scoring never fails a run. An unusable judge reply becomes a
//! metric-level error on the verdict, and evaluation moves on.

use crate::judge::JudgeModel;
use crate::schema::{ReasonScore, ResponseShape, Steps};
use crate::EvalError;
use gavel_core::{EvalParam, MetricVerdict, TestCase};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

/// Pass threshold applied when a metric does not set its own
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Top of the raw score scale the scoring prompt declares
const SCORE_RANGE_MAX: f64 = 10.0;

const REPLY_SNIPPET_LEN: usize = 200;

/// A single rubric metric bound to a judge.
#[derive(Clone)]
pub struct GEvalMetric {
    name: String,
    criteria: String,
    params: Vec<EvalParam>,
    threshold: f64,
    judge: Arc<dyn JudgeModel>,
}

impl GEvalMetric {
    /// Create a metric with the default threshold.
    ///
    /// `params` selects which test case fields the judge sees; they are
    /// rendered into the scoring prompt in the order given.
    pub fn new(
        name: impl Into<String>,
        criteria: impl Into<String>,
        params: Vec<EvalParam>,
        judge: Arc<dyn JudgeModel>,
    ) -> Self {
        Self {
            name: name.into(),
            criteria: criteria.into(),
            params,
            threshold: DEFAULT_THRESHOLD,
            judge,
        }
    }

    /// Override the pass threshold (normalized scale)
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scoring criteria the steps are derived from
    pub fn criteria(&self) -> &str {
        &self.criteria
    }

    /// Test case fields this metric reads
    pub fn params(&self) -> &[EvalParam] {
        &self.params
    }

    /// Pass threshold on the normalized scale
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one test case against this metric's criteria.
    pub async fn score(&self, case: &TestCase) -> MetricVerdict {
        debug!(
            "Scoring metric '{}' on [{}]",
            self.name,
            self.params.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
        );

        let steps = match self.derive_steps().await {
            Ok(steps) => steps,
            Err(e) => {
                warn!("Metric '{}' failed deriving steps: {}", self.name, e);
                return MetricVerdict::errored(&self.name, self.threshold, e.to_string());
            }
        };

        match self.score_with_steps(case, &steps).await {
            Ok(scored) => {
                let normalized = (scored.score / SCORE_RANGE_MAX).clamp(0.0, 1.0);
                MetricVerdict::scored(&self.name, normalized, scored.reason, self.threshold)
            }
            Err(e) => {
                warn!("Metric '{}' failed scoring: {}", self.name, e);
                MetricVerdict::errored(&self.name, self.threshold, e.to_string())
            }
        }
    }

    async fn derive_steps(&self) -> Result<Steps, EvalError> {
        let prompt = self.steps_prompt();
        let reply = self
            .judge
            .generate_async(&prompt, Some(ResponseShape::Steps))
            .await;
        parse_json_reply(&reply)
    }

    async fn score_with_steps(&self, case: &TestCase, steps: &Steps) -> Result<ReasonScore, EvalError> {
        let prompt = self.scoring_prompt(case, steps);
        let reply = self
            .judge
            .generate_async(&prompt, Some(ResponseShape::ReasonScore))
            .await;
        parse_json_reply(&reply)
    }

    fn steps_prompt(&self) -> String {
        format!(
            r#"You are an expert evaluator preparing to judge an AI application's output.

Evaluation criteria for "{name}":
{criteria}

Break the criteria down into 3-4 ordered evaluation steps. Each step must be a
single concrete check that can be applied to the output.

Respond in JSON format:
{{
  "steps": ["<step 1>", "<step 2>", ...]
}}
"#,
            name = self.name,
            criteria = self.criteria
        )
    }

    fn scoring_prompt(&self, case: &TestCase, steps: &Steps) -> String {
        let steps_text = steps
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, step))
            .collect::<Vec<_>>()
            .join("\n");

        let mut prompt = format!(
            r#"You are an expert evaluator assessing the quality of an AI application's output.

Evaluation criteria for "{name}":
{criteria}

Evaluation steps:
{steps}

"#,
            name = self.name,
            criteria = self.criteria,
            steps = steps_text
        );

        for param in &self.params {
            prompt.push_str(&format!("{}:\n{}\n\n", param.label(), case.field(*param)));
        }

        prompt.push_str(
            r#"Work through the evaluation steps, then score the output from 0 to 10, where
0 completely fails the criteria and 10 fully satisfies them.

Respond in JSON format:
{
  "score": <float 0-10>,
  "reason": "<explanation>"
}
"#,
        );

        prompt
    }
}

/// Parse a judge reply, tolerating prose around the JSON body.
fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T, EvalError> {
    let json = extract_json(reply).ok_or_else(|| EvalError::MalformedReply(reply_snippet(reply)))?;
    serde_json::from_str(json)
        .map_err(|e| EvalError::MalformedReply(format!("{} in '{}'", e, reply_snippet(reply))))
}

/// Slice out the outermost JSON object: first `{` through last `}`.
fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}

fn reply_snippet(reply: &str) -> String {
    let snippet: String = reply.chars().take(REPLY_SNIPPET_LEN).collect();
    if snippet.len() < reply.len() {
        format!("{}...", snippet)
    } else {
        snippet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::JudgeModel;
    use crate::schema::offline_reply;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedJudge {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedJudge {
        fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl JudgeModel for ScriptedJudge {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str, shape: Option<ResponseShape>) -> String {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| offline_reply(shape))
        }
    }

    fn sample_case() -> TestCase {
        TestCase::new(
            "Summarize the login requirement.",
            "Users must authenticate with email and password.",
            "Users authenticate using email plus password before accessing the app.",
        )
    }

    #[tokio::test]
    async fn test_two_phase_scoring_passes() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Compare against the reference.", "Check for contradictions."]}"#,
            r#"{"score": 8.0, "reason": "Matches the reference closely."}"#,
        ]));
        let metric = GEvalMetric::new(
            "Correctness",
            "Determine if the output is correct.",
            vec![EvalParam::ActualOutput, EvalParam::ExpectedOutput],
            judge.clone(),
        );

        let verdict = metric.score(&sample_case()).await;

        assert!(verdict.passed);
        assert_eq!(verdict.score, Some(0.8));
        assert_eq!(verdict.reason.as_deref(), Some("Matches the reference closely."));
        assert_eq!(verdict.error, None);

        let prompts = judge.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Determine if the output is correct."));
        assert!(prompts[1].contains("1. Compare against the reference."));
        assert!(prompts[1].contains("2. Check for contradictions."));
    }

    #[tokio::test]
    async fn test_scoring_prompt_includes_only_selected_params() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Read the output."]}"#,
            r#"{"score": 6.0, "reason": "fine"}"#,
        ]));
        let metric = GEvalMetric::new(
            "Clarity",
            "Assess clarity.",
            vec![EvalParam::Input, EvalParam::ActualOutput],
            judge.clone(),
        );

        let case = sample_case();
        metric.score(&case).await;

        let prompts = judge.prompts.lock().unwrap();
        let scoring = &prompts[1];
        assert!(scoring.contains(&case.input));
        assert!(scoring.contains(&case.actual_output));
        assert!(!scoring.contains("EXPECTED OUTPUT"));
    }

    #[tokio::test]
    async fn test_exact_threshold_passes() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Check it."]}"#,
            r#"{"score": 5, "reason": "borderline"}"#,
        ]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;

        assert_eq!(verdict.score, Some(0.5));
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn test_low_score_fails() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Check it."]}"#,
            r#"{"score": 3.0, "reason": "misses the point"}"#,
        ]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;

        assert_eq!(verdict.score, Some(0.3));
        assert!(!verdict.passed);
        assert_eq!(verdict.error, None);
    }

    #[tokio::test]
    async fn test_out_of_range_score_clamped() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Check it."]}"#,
            r#"{"score": 12.0, "reason": "overshoot"}"#,
        ]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;
        assert_eq!(verdict.score, Some(1.0));
    }

    #[tokio::test]
    async fn test_malformed_steps_reply_records_error() {
        let judge = Arc::new(ScriptedJudge::new(vec!["no json here at all"]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;

        assert!(!verdict.passed);
        assert_eq!(verdict.score, None);
        assert!(verdict.error.unwrap().contains("no json here at all"));
    }

    #[tokio::test]
    async fn test_malformed_score_reply_records_error() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": ["Check it."]}"#,
            r#"{"grade": "A"}"#,
        ]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;

        assert!(!verdict.passed);
        assert_eq!(verdict.score, None);
        assert!(verdict.error.is_some());
    }

    #[tokio::test]
    async fn test_empty_steps_still_scores() {
        let judge = Arc::new(ScriptedJudge::new(vec![
            r#"{"steps": []}"#,
            r#"{"score": 9.0, "reason": "good"}"#,
        ]));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;
        assert_eq!(verdict.score, Some(0.9));
    }

    #[tokio::test]
    async fn test_offline_judge_scores_pass() {
        let judge = Arc::new(crate::judge::ClaudeJudge::new(None));
        let metric = GEvalMetric::new("M", "criteria", vec![EvalParam::ActualOutput], judge);

        let verdict = metric.score(&sample_case()).await;

        assert!(verdict.passed);
        assert_eq!(verdict.score, Some(1.0));
    }

    #[test]
    fn test_json_extracted_from_prose() {
        let reply = "Here is my assessment:\n{\"score\": 7.5, \"reason\": \"solid\"}\nHope that helps!";
        let scored: ReasonScore = parse_json_reply(reply).unwrap();
        assert_eq!(scored.score, 7.5);
        assert_eq!(scored.reason, "solid");
    }

    #[test]
    fn test_reply_without_json_is_error() {
        let result: Result<ReasonScore, _> = parse_json_reply("I cannot answer that.");
        assert!(matches!(result, Err(EvalError::MalformedReply(_))));
    }

    #[test]
    fn test_braces_in_wrong_order_is_error() {
        let result: Result<ReasonScore, _> = parse_json_reply("} backwards {");
        assert!(result.is_err());
    }

    #[test]
    fn test_long_reply_snippet_truncated() {
        let reply = "x".repeat(500);
        let snippet = reply_snippet(&reply);
        assert!(snippet.len() < reply.len());
        assert!(snippet.ends_with("..."));
    }

    #[test]
    fn test_with_threshold_builder() {
        let judge = Arc::new(crate::judge::ClaudeJudge::new(None));
        let metric =
            GEvalMetric::new("M", "c", vec![EvalParam::Input], judge).with_threshold(0.9);
        assert_eq!(metric.threshold(), 0.9);
        assert_eq!(metric.name(), "M");
    }
}
