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

//! Gavel CLI
//!
//! Runs the shipped evaluation suites against their datasets and reports
//! the results, remotely when the scoreboard is configured and reachable,
//! locally otherwise.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gavel_core::TestCase;
use gavel_evals::{
    evaluate, load_test_cases, read_prompt, suites, ClaudeJudge, Credentials, GEvalMetric,
    GeminiJudge, JudgeModel, ScoreboardClient, TestRunManager,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "Gavel - LLM-as-judge evaluation harness", long_about = None)]
struct Cli {
    /// Directory holding prompt assets
    #[arg(long, default_value = "prompts")]
    prompts_dir: PathBuf,

    /// Directory holding suite datasets
    #[arg(long, default_value = "datasets")]
    datasets_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score the requirement analysis dataset with the nine-metric battery
    RequirementAnalysis,

    /// Score the test-cases table dataset with the table battery
    TableOutput,

    /// Score one canned case with the Gemini judge, reporting locally
    Smoke,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let credentials = Credentials::from_env();

    match cli.command {
        Commands::RequirementAnalysis => {
            run_dataset_suite(
                &cli,
                &credentials,
                suites::REQUIREMENT_SUITE,
                "requirement_analysis.json",
                "requirement_analysis.md",
                suites::requirement_metrics,
            )
            .await
        }
        Commands::TableOutput => {
            run_dataset_suite(
                &cli,
                &credentials,
                suites::TABLE_OUTPUT_SUITE,
                "test_cases_table_output.json",
                "test_cases_table_output.md",
                suites::table_output_metrics,
            )
            .await
        }
        Commands::Smoke => run_smoke(&cli, &credentials).await,
    }
}

/// Drive one dataset suite end to end: check credentials, load assets,
/// score, and finalize through the upload fallback.
async fn run_dataset_suite(
    cli: &Cli,
    credentials: &Credentials,
    suite: &str,
    dataset_name: &str,
    prompt_name: &str,
    build_metrics: fn(Arc<dyn JudgeModel>) -> Vec<GEvalMetric>,
) -> Result<()> {
    let scoreboard_key = credentials.require_scoreboard_key()?;

    let mut sink = ScoreboardClient::new(scoreboard_key.to_string());
    if let Some(url) = &credentials.scoreboard_url {
        sink = sink.with_base_url(url.clone());
    }

    let manager = TestRunManager::new(Arc::new(sink));
    manager.install_upload_fallback();

    let judge: Arc<dyn JudgeModel> =
        Arc::new(ClaudeJudge::new(credentials.anthropic_api_key.clone()));
    if credentials.anthropic_api_key.is_none() {
        info!("ANTHROPIC_API_KEY not set, judge replies use the offline fallback");
    }

    let prompt_asset = cli.prompts_dir.join(prompt_name);
    read_prompt(&cli.prompts_dir, prompt_name)
        .with_context(|| format!("failed to load prompt asset {}", prompt_asset.display()))?;

    let cases = load_test_cases(cli.datasets_dir.join(dataset_name))
        .context("failed to load dataset")?;

    let metrics = build_metrics(judge.clone());
    let hyperparameters = suites::build_hyperparameters(suite, prompt_asset, judge.as_ref());

    let summary = evaluate(&manager, cases, metrics, hyperparameters)
        .await
        .context("run finalization failed")?;

    if summary.failed == 0 {
        println!("✓ {}: {}", suite, summary);
    } else {
        println!("✗ {}: {}", suite, summary);
    }

    Ok(())
}

/// One canned medical-advice case against the Gemini judge. No scoreboard
/// involved; the report always renders locally.
async fn run_smoke(cli: &Cli, credentials: &Credentials) -> Result<()> {
    let judge: Arc<dyn JudgeModel> = Arc::new(GeminiJudge::new(credentials.gemini_api_key.clone()));
    if credentials.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set, judge replies use the offline fallback");
    }

    let manager = TestRunManager::local_only();

    let prompt_asset = cli.prompts_dir.join("test_generation_prompt.md");
    read_prompt(&cli.prompts_dir, "test_generation_prompt.md")
        .with_context(|| format!("failed to load prompt asset {}", prompt_asset.display()))?;

    let case = TestCase::new(
        "I have a persistent cough and fever. Should I be worried?",
        "A persistent cough and fever could signal various illnesses, from minor infections to \
         more serious conditions like pneumonia or COVID-19. It's advisable to seek medical \
         attention if symptoms worsen, persist beyond a few days, or if you experience \
         difficulty breathing, chest pain, or other concerning signs.",
        "A persistent cough and fever could indicate a range of illnesses, from a mild viral \
         infection to more serious conditions like pneumonia or COVID-19. You should seek \
         medical attention if your symptoms worsen, persist for more than a few days, or are \
         accompanied by difficulty breathing, chest pain, or other concerning signs.",
    );

    let metrics = suites::smoke_metrics(judge.clone());
    let hyperparameters =
        suites::build_hyperparameters(suites::SMOKE_SUITE, prompt_asset, judge.as_ref());

    let summary = evaluate(&manager, vec![case], metrics, hyperparameters)
        .await
        .context("run finalization failed")?;

    if summary.failed == 0 {
        println!("✓ {}: {}", suites::SMOKE_SUITE, summary);
    } else {
        println!("✗ {}: {}", suites::SMOKE_SUITE, summary);
    }

    Ok(())
}
