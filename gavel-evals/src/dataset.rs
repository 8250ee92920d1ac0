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

//! Dataset loading.
//!
//! Suite datasets are JSON arrays of objects keyed `input`,
//! `actual_output`, and `expected_output`.

use gavel_core::TestCase;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct DatasetRow {
    input: String,
    actual_output: String,
    expected_output: String,
}

/// Load the test cases in a dataset file, preserving file order.
pub fn load_test_cases(path: impl AsRef<Path>) -> Result<Vec<TestCase>, DatasetError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()));
    }

    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let rows: Vec<DatasetRow> =
        serde_json::from_str(&raw).map_err(|source| DatasetError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(rows
        .into_iter()
        .map(|row| TestCase::new(row.input, row.actual_output, row.expected_output))
        .collect())
}
