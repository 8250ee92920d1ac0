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

//! Run finalization with degradable remote reporting.
//!
//! [`TestRunManager`] owns the decision of where a finished run's report
//! goes. With the upload fallback installed, a scoreboard response that
//! lacks a run identifier downgrades that one finalize to local reporting;
//! the next run attempts the upload again. Every other publish error
//! propagates to the caller untouched.

use crate::report::{render_local_report, ReportError, ReportSink};
use gavel_core::{ReportDelivery, RunSummary, TestRun};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Finalizes runs and routes their reports.
pub struct TestRunManager {
    sink: Option<Arc<dyn ReportSink>>,
    uploads_disabled: AtomicBool,
    fallback_installed: AtomicBool,
}

impl TestRunManager {
    /// Manager that publishes finished runs to `sink`
    pub fn new(sink: Arc<dyn ReportSink>) -> Self {
        Self {
            sink: Some(sink),
            uploads_disabled: AtomicBool::new(false),
            fallback_installed: AtomicBool::new(false),
        }
    }

    /// Manager with no remote sink; every finalize reports locally
    pub fn local_only() -> Self {
        Self {
            sink: None,
            uploads_disabled: AtomicBool::new(false),
            fallback_installed: AtomicBool::new(false),
        }
    }

    /// Install the upload fallback. Repeat installs are no-ops.
    pub fn install_upload_fallback(&self) {
        if self.fallback_installed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Upload fallback installed");
    }

    /// Whether the upload fallback has been installed
    pub fn fallback_installed(&self) -> bool {
        self.fallback_installed.load(Ordering::SeqCst)
    }

    /// Whether uploads are currently suppressed. Only ever true inside a
    /// degraded finalize; the flag is restored before `wrap_up_run` returns.
    pub fn uploads_disabled(&self) -> bool {
        self.uploads_disabled.load(Ordering::SeqCst)
    }

    /// Finalize a finished run.
    ///
    /// Without the fallback installed this is a plain finalize: publish to
    /// the sink when one is configured, render the local report, and
    /// propagate any publish error. With the fallback installed, a
    /// [`ReportError::MissingRunId`] from the sink is logged and the run is
    /// re-finalized locally; uploads are re-enabled afterwards so the next
    /// run retries the remote path.
    pub async fn wrap_up_run(&self, run: &TestRun) -> Result<RunSummary, ReportError> {
        if !self.fallback_installed() {
            return self.finalize(run).await;
        }

        self.uploads_disabled.store(false, Ordering::SeqCst);

        match self.finalize(run).await {
            Err(ReportError::MissingRunId) => {
                warn!(
                    "Scoreboard upload failed (response missing 'id'). \
                     Falling back to local reporting for this run."
                );
                let _guard = UploadsDisabledGuard::engage(&self.uploads_disabled);
                self.finalize(run).await
            }
            other => other,
        }
    }

    async fn finalize(&self, run: &TestRun) -> Result<RunSummary, ReportError> {
        let delivery = match &self.sink {
            Some(sink) if !self.uploads_disabled() => {
                let published = sink.publish(run).await?;
                info!("Run {} published to scoreboard as {}", run.run_id, published.id);
                ReportDelivery::Remote {
                    link: published.link,
                }
            }
            _ => ReportDelivery::Local,
        };

        println!("{}", render_local_report(run));

        Ok(RunSummary::from_run(run, delivery))
    }
}

/// Suppresses uploads for the scope of one degraded finalize. Dropping the
/// guard re-enables uploads, so the next run retries the remote path even
/// if the degraded finalize exits early.
struct UploadsDisabledGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> UploadsDisabledGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self { flag }
    }
}

impl Drop for UploadsDisabledGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PublishedRun;
    use async_trait::async_trait;
    use gavel_core::{CaseRecord, Hyperparameters, MetricVerdict, TestCase};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Sink whose publish outcomes are scripted per call.
    struct ScriptedSink {
        outcomes: Mutex<VecDeque<Result<PublishedRun, ReportError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSink {
        fn new(outcomes: Vec<Result<PublishedRun, ReportError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReportSink for ScriptedSink {
        async fn publish(&self, _run: &TestRun) -> Result<PublishedRun, ReportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ReportError::MissingRunId))
        }
    }

    fn accepted() -> Result<PublishedRun, ReportError> {
        Ok(PublishedRun {
            id: "run-1".to_string(),
            link: Some("https://scoreboard.gavel.dev/runs/run-1".to_string()),
        })
    }

    fn sample_run() -> TestRun {
        let mut run = TestRun::new(Hyperparameters::new("suite_v1", "judge", "prompts/p.md"));
        run.add_case(CaseRecord::new(
            TestCase::new("q", "a", "e"),
            vec![MetricVerdict::scored("Correctness", 1.0, "exact", 0.5)],
        ));
        run
    }

    #[tokio::test]
    async fn test_local_only_manager_reports_locally() {
        let manager = TestRunManager::local_only();
        let summary = manager.wrap_up_run(&sample_run()).await.unwrap();

        assert_eq!(summary.delivery, ReportDelivery::Local);
        assert_eq!(summary.passed, 1);
    }

    #[tokio::test]
    async fn test_successful_upload_is_remote() {
        let sink = Arc::new(ScriptedSink::new(vec![accepted()]));
        let manager = TestRunManager::new(sink.clone());
        manager.install_upload_fallback();

        let summary = manager.wrap_up_run(&sample_run()).await.unwrap();

        assert_eq!(
            summary.delivery,
            ReportDelivery::Remote {
                link: Some("https://scoreboard.gavel.dev/runs/run-1".to_string())
            }
        );
        assert_eq!(sink.calls(), 1);
        assert!(!manager.uploads_disabled());
    }

    #[tokio::test]
    async fn test_install_is_idempotent() {
        let manager = TestRunManager::local_only();
        assert!(!manager.fallback_installed());

        manager.install_upload_fallback();
        manager.install_upload_fallback();

        assert!(manager.fallback_installed());
        assert!(!manager.uploads_disabled());
    }

    #[tokio::test]
    async fn test_missing_id_degrades_to_local() {
        let sink = Arc::new(ScriptedSink::new(vec![Err(ReportError::MissingRunId)]));
        let manager = TestRunManager::new(sink.clone());
        manager.install_upload_fallback();

        let summary = manager.wrap_up_run(&sample_run()).await.unwrap();

        assert_eq!(summary.delivery, ReportDelivery::Local);
        assert_eq!(sink.calls(), 1);
        assert!(!manager.uploads_disabled(), "uploads must be re-enabled after the degraded run");
    }

    #[tokio::test]
    async fn test_next_run_retries_the_upload() {
        let sink = Arc::new(ScriptedSink::new(vec![
            Err(ReportError::MissingRunId),
            accepted(),
        ]));
        let manager = TestRunManager::new(sink.clone());
        manager.install_upload_fallback();

        let first = manager.wrap_up_run(&sample_run()).await.unwrap();
        assert_eq!(first.delivery, ReportDelivery::Local);

        let second = manager.wrap_up_run(&sample_run()).await.unwrap();
        assert!(matches!(second.delivery, ReportDelivery::Remote { .. }));
        assert_eq!(sink.calls(), 2);
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let sink = Arc::new(ScriptedSink::new(vec![Err(ReportError::ApiError(
            "connection reset".to_string(),
        ))]));
        let manager = TestRunManager::new(sink.clone());
        manager.install_upload_fallback();

        let result = manager.wrap_up_run(&sample_run()).await;

        match result {
            Err(ReportError::ApiError(text)) => assert_eq!(text, "connection reset"),
            other => panic!("expected ApiError, got {:?}", other),
        }
        assert_eq!(sink.calls(), 1, "no retry for non-degradable errors");
    }

    #[tokio::test]
    async fn test_missing_id_propagates_without_install() {
        let sink = Arc::new(ScriptedSink::new(vec![Err(ReportError::MissingRunId)]));
        let manager = TestRunManager::new(sink.clone());

        let result = manager.wrap_up_run(&sample_run()).await;

        assert!(matches!(result, Err(ReportError::MissingRunId)));
        assert_eq!(sink.calls(), 1);
    }
}
