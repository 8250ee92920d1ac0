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

//! Environment-derived credentials.
//!
//! Judge keys are optional: an absent key puts the judge in offline mode.
//! The scoreboard key is optional here too, but suites that report
//! remotely call [`Credentials::require_scoreboard_key`] and fail hard
//! without it.

use thiserror::Error;

/// Errors from credential checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SCOREBOARD_API_KEY is required for scoreboard reporting. Update your .env file.")]
    MissingScoreboardKey,
}

/// Credentials and endpoints read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// `ANTHROPIC_API_KEY`, enables the Claude judge's remote path
    pub anthropic_api_key: Option<String>,

    /// `GEMINI_API_KEY`, enables the Gemini judge's remote path
    pub gemini_api_key: Option<String>,

    /// `SCOREBOARD_API_KEY`, required for remote reporting
    pub scoreboard_api_key: Option<String>,

    /// `GAVEL_SCOREBOARD_URL`, overrides the default scoreboard endpoint
    pub scoreboard_url: Option<String>,
}

impl Credentials {
    /// Read credentials from the environment. Unset and empty variables
    /// both count as absent.
    pub fn from_env() -> Self {
        Self {
            anthropic_api_key: read_var("ANTHROPIC_API_KEY"),
            gemini_api_key: read_var("GEMINI_API_KEY"),
            scoreboard_api_key: read_var("SCOREBOARD_API_KEY"),
            scoreboard_url: read_var("GAVEL_SCOREBOARD_URL"),
        }
    }

    /// The scoreboard key, or a hard error when it is absent
    pub fn require_scoreboard_key(&self) -> Result<&str, ConfigError> {
        self.scoreboard_api_key
            .as_deref()
            .ok_or(ConfigError::MissingScoreboardKey)
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
