//! The GitHub Action entry point.

use std::process::ExitCode;

use anyhow::{Context, Result};
use speclint_github::{build_client, CheckRuns, Conclusion, OctocrabChecks, RepositoryInfo};
use speclint_rules::Builtins;

use crate::config::Config;
use crate::pipeline;

/// Connects to GitHub and runs the action.
///
/// # Errors
///
/// Returns the first fatal error of any stage.
pub async fn execute(config: &Config) -> Result<Conclusion> {
    let client = build_client(&config.repo_token, &config.api_base_url())
        .context("Failed to create GitHub client")?;
    execute_with(config, &OctocrabChecks::new(client)).await
}

/// Reads the event and runs the pipeline against `checks`.
///
/// Nothing is sent to `checks` when the event cannot be read.
///
/// # Errors
///
/// Returns the first fatal error of any stage.
pub async fn execute_with<C: CheckRuns>(config: &Config, checks: &C) -> Result<Conclusion> {
    let repository = RepositoryInfo::from_event_file(&config.event_path, &config.event_name)
        .await
        .context("Failed to read repository info")?;
    tracing::info!(
        "Linting {}/{} at {} ({})",
        repository.owner,
        repository.repo,
        repository.sha,
        repository.event_name
    );

    let conclusion = pipeline::run_checks(config, &repository, checks, &Builtins).await?;
    Ok(conclusion)
}

/// Runs the action and maps the outcome to an exit code.
pub async fn run(config: &Config) -> ExitCode {
    match execute(config).await {
        Ok(Conclusion::Success) => {
            tracing::info!("Lint completed successfully");
            ExitCode::SUCCESS
        }
        Ok(Conclusion::Failure) => {
            tracing::error!("Lint completed with some errors");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e:#}");
            tracing::error!("Lint failed");
            ExitCode::FAILURE
        }
    }
}
