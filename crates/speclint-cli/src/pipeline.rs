//! The action pipeline from a created check run to its completion.
//!
//! ```text
//! Idle → ConfigLoaded → CheckCreated → Linted → Reported(success|failure)
//!                            ↘ Failed(error) → Reported(failure, message)
//! ```
//!
//! Failures before the check run exists are returned without reporting.
//! After that, every failure is reported on the check run.

use std::path::{Path, PathBuf};

use speclint_core::ruleset::{self, BuiltinRulesets, RulesetResolver};
use speclint_core::{Engine, EngineError, LintEngine, ResolveError};
use speclint_github::{
    has_failures, sort_annotations, Annotation, CheckRunReporter, CheckRuns, Conclusion,
    ReportError, RepositoryInfo,
};

use crate::config::Config;
use crate::files::{self, DiscoveryError, FileWithContent};

/// Errors raised after the check run was created.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The ruleset could not be located or loaded.
    #[error(transparent)]
    Ruleset(#[from] ResolveError),

    /// The file glob is invalid.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A document could not be linted.
    #[error("{}: {source}", path.display())]
    Engine {
        /// The document.
        path: PathBuf,
        /// The engine error.
        source: EngineError,
    },

    /// The checks API failed.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Resolves the configured ruleset into an engine.
///
/// # Errors
///
/// Returns an error if the ruleset cannot be located, fetched or loaded.
pub async fn build_engine(
    reference: &str,
    workspace: &Path,
    builtins: &dyn BuiltinRulesets,
) -> Result<Engine, ResolveError> {
    let locator = ruleset::locate(reference, workspace).await?;
    let resolver = RulesetResolver::new(builtins, workspace)?;
    let ruleset = resolver.resolve(&locator).await?;
    tracing::info!(
        "Loaded {} rule(s), {} enabled",
        ruleset.rules().len(),
        ruleset.enabled_count()
    );
    Ok(Engine::new(ruleset))
}

/// Lints every file and maps the diagnostics to sorted annotations.
///
/// # Errors
///
/// Returns the first document the engine fails on.
pub fn annotate<E: LintEngine + ?Sized>(
    engine: &E,
    workspace: &Path,
    files: &[FileWithContent],
) -> Result<Vec<Annotation>, PipelineError> {
    let mut annotations = Vec::new();
    for file in files {
        let diagnostics = engine
            .run(&file.content)
            .map_err(|e| PipelineError::Engine {
                path: file.path.clone(),
                source: e,
            })?;
        tracing::debug!("{}: {} diagnostic(s)", file.path.display(), diagnostics.len());
        annotations.extend(
            diagnostics
                .iter()
                .map(|d| Annotation::from_diagnostic(d, workspace, &file.path)),
        );
    }
    sort_annotations(&mut annotations);
    Ok(annotations)
}

/// Resolves the ruleset, then discovers, reads and lints the files.
async fn lint(
    config: &Config,
    builtins: &dyn BuiltinRulesets,
) -> Result<Vec<Annotation>, PipelineError> {
    let engine = build_engine(&config.ruleset, &config.workspace, builtins).await?;
    let paths = files::discover(&config.file_glob, &config.workspace)?;
    let files = files::read_all(paths).await;
    annotate(&engine, &config.workspace, &files)
}

/// Runs the pipeline against an existing repository and checks client.
///
/// Returns the conclusion the check run was completed with.
///
/// # Errors
///
/// Returns an error if the check run cannot be created, if linting fails,
/// or if completing the check run fails. Lint failures are reported on
/// the check run before being returned.
pub async fn run_checks<C: CheckRuns>(
    config: &Config,
    repository: &RepositoryInfo,
    checks: &C,
    builtins: &dyn BuiltinRulesets,
) -> Result<Conclusion, PipelineError> {
    let reporter = CheckRunReporter::new(checks, repository, config.check_name.as_str());
    let check_run = reporter.create().await?;

    let (conclusion, result) = match lint(config, builtins).await {
        Ok(annotations) => {
            let conclusion = if has_failures(&annotations) {
                Conclusion::Failure
            } else {
                Conclusion::Success
            };
            let reported = reporter
                .complete(check_run.id, conclusion, &annotations, None)
                .await;
            (conclusion, reported.map_err(PipelineError::from))
        }
        Err(e) => {
            tracing::error!("{e}");
            let reported = reporter
                .complete(check_run.id, Conclusion::Failure, &[], Some(&e.to_string()))
                .await;
            if let Err(report_err) = reported {
                tracing::error!("Failed to report error on check run: {report_err}");
            }
            (Conclusion::Failure, Err(e))
        }
    };

    if let Err(PipelineError::Report(e)) = &result {
        let message = format!("Failed to complete check run: {e}");
        if let Err(retry_err) = reporter
            .complete(check_run.id, Conclusion::Failure, &[], Some(&message))
            .await
        {
            tracing::warn!("Best-effort failure update also failed: {retry_err}");
        }
    }

    result.map(|()| conclusion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speclint_core::{Diagnostic, Range, Severity};

    struct FixedEngine(Vec<Diagnostic>);

    impl LintEngine for FixedEngine {
        fn run(&self, _source: &str) -> Result<Vec<Diagnostic>, EngineError> {
            Ok(self.0.clone())
        }
    }

    fn file(path: &str) -> FileWithContent {
        FileWithContent {
            path: PathBuf::from(path),
            content: String::new(),
        }
    }

    #[test]
    fn annotations_are_sorted_across_files() {
        let engine = FixedEngine(vec![
            Diagnostic::new("b", "second", Severity::Warn, Range::from_coords(5, 0, 5, 3)),
            Diagnostic::new("a", "first", Severity::Error, Range::from_coords(0, 0, 0, 3)),
        ]);
        let files = [file("/work/one.yaml"), file("/work/two.yaml")];
        let annotations = annotate(&engine, Path::new("/work"), &files).unwrap();

        let summary: Vec<(usize, &str, &str)> = annotations
            .iter()
            .map(|a| (a.start_line, a.path.as_str(), a.title.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, "one.yaml", "a"),
                (1, "two.yaml", "a"),
                (6, "one.yaml", "b"),
                (6, "two.yaml", "b"),
            ]
        );
    }

    #[test]
    fn engine_errors_name_the_file() {
        struct Broken;
        impl LintEngine for Broken {
            fn run(&self, _source: &str) -> Result<Vec<Diagnostic>, EngineError> {
                Err(EngineError::Parse(speclint_core::DocumentError::Syntax("bad".into())))
            }
        }
        let err = annotate(&Broken, Path::new("/work"), &[file("/work/x.yaml")]).unwrap_err();
        assert_eq!(err.to_string(), "/work/x.yaml: failed to parse document: syntax error: bad");
    }
}
