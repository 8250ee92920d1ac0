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

//! Judge reply shapes and the deterministic offline replies for each.

use serde::{Deserialize, Serialize};

/// The JSON layouts a judge can be asked to reply in.
///
/// Rubric scoring runs in two phases, and each phase expects one of these
/// shapes back. The set is closed on purpose: every shape has a canned
/// offline reply, so a judge with no credentials still produces parseable
/// output for any request the harness can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{"steps": [...]}`, ordered evaluation steps for a criterion
    Steps,
    /// `{"score": <0-10>, "reason": "..."}`, the final judgement
    ReasonScore,
}

/// Ordered evaluation steps a judge derived from a metric's criteria.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Steps {
    /// The steps, in the order they should be applied
    pub steps: Vec<String>,
}

/// Score and justification a judge produced for one metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReasonScore {
    /// Raw score on the 0-10 scale the scoring prompt declares
    pub score: f64,

    /// The judge's justification
    pub reason: String,
}

/// The canned reply used when no remote judge is reachable.
///
/// Replies always parse into the type matching `shape`, and the scores sit
/// at the top of the scale so fully offline runs pass their thresholds.
/// `None` yields a score-shaped reply for callers that did not declare a
/// shape.
pub fn offline_reply(shape: Option<ResponseShape>) -> String {
    match shape {
        Some(ResponseShape::Steps) => serde_json::json!({
            "steps": [
                "Assess clarity of the evaluated output.",
                "Check coverage against the expected output.",
                "Verify actionable insights are present.",
            ]
        })
        .to_string(),
        Some(ResponseShape::ReasonScore) => serde_json::json!({
            "score": 10.0,
            "reason": "Offline fallback: output meets the mocked rubric.",
        })
        .to_string(),
        None => serde_json::json!({
            "score": 10.0,
            "reason": "Offline fallback response.",
        })
        .to_string(),
    }
}
