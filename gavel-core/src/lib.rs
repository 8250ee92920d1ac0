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

//! Gavel Core
//!
//! Shared data contracts for the gavel evaluation harness: test cases,
//! metric verdicts, and finished run records.

pub mod run;
pub mod test_case;

pub use run::{CaseRecord, MetricVerdict, ReportDelivery, RunSummary, TestRun};
pub use test_case::{EvalParam, Hyperparameters, TestCase};
