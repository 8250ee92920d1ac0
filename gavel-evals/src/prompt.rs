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

//! Prompt asset loading.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from loading a prompt asset.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read a named prompt asset from the prompts directory.
pub fn read_prompt(prompts_dir: impl AsRef<Path>, name: &str) -> Result<String, PromptError> {
    let path = prompts_dir.as_ref().join(name);

    if !path.exists() {
        return Err(PromptError::NotFound(path));
    }

    std::fs::read_to_string(&path).map_err(|source| PromptError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("analysis.md")).unwrap();
        file.write_all(b"You are a requirements analyst.\n").unwrap();

        let prompt = read_prompt(dir.path(), "analysis.md").unwrap();
        assert_eq!(prompt, "You are a requirements analyst.\n");
    }

    #[test]
    fn test_missing_prompt_names_resolved_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_prompt(dir.path(), "absent.md");

        match result {
            Err(PromptError::NotFound(path)) => {
                assert_eq!(path, dir.path().join("absent.md"));
                assert!(path.to_string_lossy().ends_with("absent.md"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found_display() {
        let text = PromptError::NotFound(PathBuf::from("prompts/missing.md")).to_string();
        assert!(text.contains("Prompt file not found: prompts/missing.md"));
    }
}
