//! Local lint command: the action pipeline without GitHub.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use speclint_core::{LintEngine, LintResult};
use speclint_github::annotation::relative_path;
use speclint_rules::Builtins;

use crate::files::{self, FileWithContent};
use crate::pipeline;
use crate::OutputFormat;

/// Diagnostics for a set of local files.
#[derive(Debug)]
pub struct LocalReport {
    /// Diagnostics with workspace-relative sources.
    pub result: LintResult,
    /// The linted documents, keyed by the same relative paths.
    pub sources: Vec<FileWithContent>,
}

/// Lints the files matching `glob` under `workspace`.
///
/// # Errors
///
/// Returns an error if the ruleset cannot be resolved, the glob is
/// invalid, or a document cannot be parsed.
pub async fn collect(glob: &str, ruleset: &str, workspace: &Path) -> Result<LocalReport> {
    let engine = pipeline::build_engine(ruleset, workspace, &Builtins)
        .await
        .context("Failed to load ruleset")?;
    let paths = files::discover(glob, workspace)?;
    let files = files::read_all(paths).await;

    let mut result = LintResult::new();
    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let diagnostics = engine
            .run(&file.content)
            .with_context(|| format!("Failed to lint {}", file.path.display()))?;
        let name = relative_path(workspace, &file.path);
        result.extend(LintResult {
            diagnostics: diagnostics
                .into_iter()
                .map(|d| d.with_source(&name))
                .collect(),
            files_checked: 1,
        });
        sources.push(FileWithContent {
            path: name.into(),
            content: file.content,
        });
    }

    Ok(LocalReport { result, sources })
}

/// Runs the lint command, returning a failing exit code on errors.
///
/// # Errors
///
/// Returns an error if linting or printing fails.
pub async fn run(
    glob: &str,
    ruleset: &str,
    workspace: &Path,
    format: OutputFormat,
) -> Result<ExitCode> {
    let report = collect(glob, ruleset, workspace).await?;
    tracing::info!(
        "Linted {} file(s) under {}",
        report.result.files_checked,
        workspace.display()
    );

    super::output::print(&report.result, &report.sources, format)?;

    if report.result.has_errors() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
