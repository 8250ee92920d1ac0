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

//! The run driver: scores every case against every metric, then hands the
//! assembled run to the manager for finalization.

use crate::geval::GEvalMetric;
use crate::report::ReportError;
use crate::run_manager::TestRunManager;
use crate::{EvalConfig, EvalError};
use futures::future::join_all;
use gavel_core::{CaseRecord, Hyperparameters, MetricVerdict, RunSummary, TestCase, TestRun};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Evaluate `cases` against `metrics` with the default configuration.
///
/// Cases are scored concurrently, one task per case, with intra-case
/// metric scoring joined in battery order. Scoring failures are recorded
/// on the affected verdicts; only finalization can return an error. An
/// empty case list is a no-op: nothing is scored or published.
pub async fn evaluate(
    manager: &TestRunManager,
    cases: Vec<TestCase>,
    metrics: Vec<GEvalMetric>,
    hyperparameters: Hyperparameters,
) -> Result<RunSummary, ReportError> {
    evaluate_with_config(manager, cases, metrics, hyperparameters, EvalConfig::default()).await
}

/// [`evaluate`] with an explicit [`EvalConfig`].
pub async fn evaluate_with_config(
    manager: &TestRunManager,
    cases: Vec<TestCase>,
    metrics: Vec<GEvalMetric>,
    hyperparameters: Hyperparameters,
    config: EvalConfig,
) -> Result<RunSummary, ReportError> {
    if cases.is_empty() {
        info!("No test cases for suite '{}', skipping run", hyperparameters.suite);
        return Ok(RunSummary::empty());
    }

    info!(
        "Starting run for suite '{}': {} cases, {} metrics",
        hyperparameters.suite,
        cases.len(),
        metrics.len()
    );

    let started = Instant::now();
    let mut run = TestRun::new(hyperparameters);

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let metrics = Arc::new(metrics);
    let metric_timeout = Duration::from_secs(config.metric_timeout_secs);

    let mut tasks = Vec::new();
    for (index, case) in cases.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let metrics = Arc::clone(&metrics);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire().await.unwrap();
            let verdicts = score_case(&case, &metrics, metric_timeout).await;
            (index, CaseRecord::new(case, verdicts))
        }));
    }

    let mut records = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(entry) => records.push(entry),
            Err(e) => error!("Case task panicked: {}", e),
        }
    }

    records.sort_by_key(|(index, _)| *index);
    for (_, record) in records {
        run.add_case(record);
    }

    run.duration_ms = started.elapsed().as_millis() as u64;
    info!("Run {} scored in {} ms", run.run_id, run.duration_ms);

    manager.wrap_up_run(&run).await
}

async fn score_case(
    case: &TestCase,
    metrics: &[GEvalMetric],
    metric_timeout: Duration,
) -> Vec<MetricVerdict> {
    let futures = metrics.iter().map(|metric| async move {
        match tokio::time::timeout(metric_timeout, metric.score(case)).await {
            Ok(verdict) => verdict,
            Err(_) => {
                warn!("Metric '{}' timed out", metric.name());
                MetricVerdict::errored(
                    metric.name(),
                    metric.threshold(),
                    EvalError::Timeout.to_string(),
                )
            }
        }
    });

    join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::ClaudeJudge;
    use crate::report::{PublishedRun, ReportSink};
    use crate::suites;
    use async_trait::async_trait;
    use gavel_core::EvalParam;
    use std::sync::Mutex;

    /// Sink that accepts every run and keeps a copy of what it saw.
    struct CapturingSink {
        seen: Mutex<Vec<TestRun>>,
    }

    impl CapturingSink {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReportSink for CapturingSink {
        async fn publish(&self, run: &TestRun) -> Result<PublishedRun, ReportError> {
            self.seen.lock().unwrap().push(run.clone());
            Ok(PublishedRun {
                id: format!("run-{}", self.seen.lock().unwrap().len()),
                link: None,
            })
        }
    }

    fn offline_judge() -> Arc<dyn crate::judge::JudgeModel> {
        Arc::new(ClaudeJudge::new(None))
    }

    fn hyperparameters() -> Hyperparameters {
        Hyperparameters::new("suite_v1", "offline", "prompts/p.md")
    }

    #[tokio::test]
    async fn test_empty_dataset_is_noop() {
        let sink = Arc::new(CapturingSink::new());
        let manager = TestRunManager::new(sink.clone());
        manager.install_upload_fallback();

        let summary = evaluate(
            &manager,
            Vec::new(),
            suites::smoke_metrics(offline_judge()),
            hyperparameters(),
        )
        .await
        .unwrap();

        assert_eq!(summary, RunSummary::empty());
        assert!(sink.seen.lock().unwrap().is_empty(), "nothing may be published");
    }

    #[tokio::test]
    async fn test_every_pair_is_scored() {
        let manager = TestRunManager::local_only();
        let judge = offline_judge();
        let metrics = vec![
            GEvalMetric::new("First", "criteria one", vec![EvalParam::ActualOutput], judge.clone()),
            GEvalMetric::new("Second", "criteria two", vec![EvalParam::ActualOutput], judge),
        ];
        let cases = vec![
            TestCase::new("q1", "a1", "e1"),
            TestCase::new("q2", "a2", "e2"),
            TestCase::new("q3", "a3", "e3"),
        ];

        let summary = evaluate(&manager, cases, metrics, hyperparameters())
            .await
            .unwrap();

        assert_eq!(summary.total_verdicts, 6);
        assert_eq!(summary.passed, 6, "offline scores sit at the top of the scale");
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_published_run_preserves_case_order() {
        let sink = Arc::new(CapturingSink::new());
        let manager = TestRunManager::new(sink.clone());

        let cases = vec![
            TestCase::new("first", "a", "e"),
            TestCase::new("second", "a", "e"),
            TestCase::new("third", "a", "e"),
            TestCase::new("fourth", "a", "e"),
        ];

        evaluate(
            &manager,
            cases,
            suites::smoke_metrics(offline_judge()),
            hyperparameters(),
        )
        .await
        .unwrap();

        let seen = sink.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let inputs: Vec<&str> = seen[0].cases.iter().map(|c| c.case.input.as_str()).collect();
        assert_eq!(inputs, vec!["first", "second", "third", "fourth"]);
        assert_eq!(seen[0].hyperparameters.suite, "suite_v1");
    }

    #[tokio::test]
    async fn test_battery_order_preserved_within_case() {
        let sink = Arc::new(CapturingSink::new());
        let manager = TestRunManager::new(sink.clone());

        evaluate(
            &manager,
            vec![TestCase::new("q", "a", "e")],
            suites::requirement_metrics(offline_judge()),
            hyperparameters(),
        )
        .await
        .unwrap();

        let seen = sink.seen.lock().unwrap();
        let names: Vec<&str> = seen[0].cases[0]
            .verdicts
            .iter()
            .map(|v| v.name.as_str())
            .collect();
        assert_eq!(names[0], "Correctness");
        assert_eq!(names[8], "Bias and Fairness");
        assert_eq!(names.len(), 9);
    }

    #[tokio::test]
    async fn test_single_concurrency_still_completes() {
        let manager = TestRunManager::local_only();
        let config = EvalConfig {
            max_concurrent: 1,
            ..EvalConfig::default()
        };

        let summary = evaluate_with_config(
            &manager,
            vec![TestCase::new("q1", "a", "e"), TestCase::new("q2", "a", "e")],
            suites::smoke_metrics(offline_judge()),
            hyperparameters(),
            config,
        )
        .await
        .unwrap();

        assert_eq!(summary.total_verdicts, 2);
    }
}
