//! Integration test: the action pipeline against an in-memory checks API.
//!
//! Each test builds a workspace in a temp directory, runs
//! `pipeline::run_checks` and inspects the recorded check-run calls.

use speclint_cli::commands::run;
use speclint_cli::config::Config;
use speclint_cli::files;
use speclint_cli::pipeline::{self, PipelineError};
use speclint_github::checks::{CheckStatus, CreateCheckRun, UpdateCheckRun};
use speclint_github::{
    AnnotationLevel, CheckRun, CheckRuns, Conclusion, ReportError, RepositoryInfo,
};
use speclint_rules::Builtins;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

const RULESET: &str = r#"{
  "rules": {
    "info-version-semver": {
      "description": "API version must be a semantic version.",
      "severity": "error",
      "given": "$.info.version",
      "then": {
        "function": "pattern",
        "functionOptions": { "match": "^\\d+\\.\\d+\\.\\d+$" }
      }
    }
  }
}"#;

const VALID: &str = "openapi: 3.0.0\ninfo:\n  title: Pets\n  version: 1.0.0\npaths: {}\n";
const DRAFT: &str = "openapi: 3.0.0\ninfo:\n  title: Pets\n  version: draft\npaths: {}\n";

const PUSH_EVENT: &str = r#"{
  "after": "0123456789abcdef0123456789abcdef01234567",
  "repository": { "name": "petstore", "owner": { "login": "acme" } }
}"#;

#[derive(Default)]
struct Recorder {
    created: Mutex<Vec<CreateCheckRun>>,
    updates: Mutex<Vec<UpdateCheckRun>>,
    failing_updates: usize,
    attempts: Mutex<usize>,
}

impl CheckRuns for Recorder {
    async fn create_check_run(
        &self,
        _owner: &str,
        _repo: &str,
        body: &CreateCheckRun,
    ) -> Result<CheckRun, ReportError> {
        self.created.lock().unwrap().push(body.clone());
        Ok(CheckRun { id: 42 })
    }

    async fn update_check_run(
        &self,
        _owner: &str,
        _repo: &str,
        check_run_id: u64,
        body: &UpdateCheckRun,
    ) -> Result<CheckRun, ReportError> {
        let mut attempts = self.attempts.lock().unwrap();
        *attempts += 1;
        if *attempts <= self.failing_updates {
            return Err(ReportError::Api {
                operation: "update",
                source: "502 Bad Gateway".into(),
            });
        }
        self.updates.lock().unwrap().push(body.clone());
        Ok(CheckRun { id: check_run_id })
    }
}

fn repository() -> RepositoryInfo {
    RepositoryInfo {
        owner: "acme".into(),
        repo: "petstore".into(),
        event_name: "push".into(),
        sha: "9f8e7d6c5b4a39281706f5e4d3c2b1a098765432".into(),
    }
}

fn config(workspace: &Path) -> Config {
    Config {
        event_path: workspace.join("event.json"),
        repo_token: "token".into(),
        workspace: workspace.to_path_buf(),
        file_glob: "**/*.yaml".into(),
        event_name: "push".into(),
        ruleset: String::new(),
        server_url: "https://github.com".into(),
        api_url: None,
        check_name: "speclint".into(),
        debug: false,
    }
}

fn workspace(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".speclint.json"), RULESET).unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

// ── Scenarios ──

#[tokio::test]
async fn error_diagnostic_fails_the_check() {
    let dir = workspace(&[("api/openapi.yaml", DRAFT.as_bytes())]);
    let recorder = Recorder::default();

    let conclusion = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();
    assert_eq!(conclusion, Conclusion::Failure);

    let created = recorder.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].head_sha, "9f8e7d6c5b4a39281706f5e4d3c2b1a098765432");
    assert_eq!(created[0].status, CheckStatus::InProgress);

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].conclusion, Conclusion::Failure);
    assert_eq!(updates[0].output.summary, "Lint completed with some errors");

    let annotations = &updates[0].output.annotations;
    assert_eq!(annotations.len(), 1);
    assert_eq!(annotations[0].annotation_level, AnnotationLevel::Failure);
    assert_eq!(annotations[0].start_line, 4);
    assert_eq!(annotations[0].end_line, 4);
    assert_eq!(annotations[0].start_column, Some(12));
    assert!(annotations[0].end_column.is_some());
    assert_eq!(annotations[0].path, "api/openapi.yaml");
    assert_eq!(annotations[0].title, "info-version-semver");
}

#[tokio::test]
async fn clean_documents_succeed_with_no_annotations() {
    let dir = workspace(&[("openapi.yaml", VALID.as_bytes())]);
    let recorder = Recorder::default();

    let conclusion = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();
    assert_eq!(conclusion, Conclusion::Success);

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].status, CheckStatus::Completed);
    assert_eq!(updates[0].output.summary, "Lint completed successfully");
    assert_eq!(updates[0].output.text, "0 problems (0 errors, 0 warnings, 0 notices)");
    assert!(updates[0].output.annotations.is_empty());
}

#[tokio::test]
async fn unreadable_files_are_skipped() {
    let dir = workspace(&[
        ("a.yaml", VALID.as_bytes()),
        ("b.yaml", &[0xff_u8, 0xfe, 0x00][..]),
    ]);

    let paths = files::discover("**/*.yaml", dir.path()).unwrap();
    assert_eq!(paths.len(), 2);
    let read = files::read_all(paths).await;
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].path, dir.path().join("a.yaml"));

    let recorder = Recorder::default();
    let conclusion = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();
    assert_eq!(conclusion, Conclusion::Success);
}

#[tokio::test]
async fn no_matching_files_succeeds() {
    let dir = workspace(&[]);
    let recorder = Recorder::default();

    let conclusion = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();
    assert_eq!(conclusion, Conclusion::Success);
    assert_eq!(recorder.updates.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn many_annotations_are_chunked() {
    let documents: Vec<(String, &[u8])> = (0..120)
        .map(|i| (format!("specs/{i:03}.yaml"), DRAFT.as_bytes()))
        .collect();
    let refs: Vec<(&str, &[u8])> = documents.iter().map(|(n, c)| (n.as_str(), *c)).collect();
    let dir = workspace(&refs);
    let recorder = Recorder::default();

    pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();

    let updates = recorder.updates.lock().unwrap();
    let sizes: Vec<usize> = updates.iter().map(|u| u.output.annotations.len()).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
    let text = "120 problems (120 errors, 0 warnings, 0 notices)";
    assert!(updates.iter().all(|u| u.output.text == text));
}

#[tokio::test]
async fn non_mapping_documents_are_linted_without_error() {
    let dir = workspace(&[
        ("openapi.yaml", VALID.as_bytes()),
        ("list.yaml", &b"- a\n- b\n"[..]),
        ("note.yaml", &b"just a string\n"[..]),
    ]);
    let recorder = Recorder::default();

    let conclusion = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap();
    assert_eq!(conclusion, Conclusion::Success);
    assert!(recorder.updates.lock().unwrap()[0].output.annotations.is_empty());
}

#[tokio::test]
async fn push_event_reaches_the_checks_api() {
    let dir = workspace(&[("openapi.yaml", DRAFT.as_bytes())]);
    fs::write(dir.path().join("event.json"), PUSH_EVENT).unwrap();
    let recorder = Recorder::default();

    let conclusion = run::execute_with(&config(dir.path()), &recorder).await.unwrap();
    assert_eq!(conclusion, Conclusion::Failure);

    let created = recorder.created.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].head_sha, "0123456789abcdef0123456789abcdef01234567");
}

// ── Error paths ──

#[tokio::test]
async fn unsupported_event_makes_no_check_run_calls() {
    let dir = workspace(&[("openapi.yaml", DRAFT.as_bytes())]);
    fs::write(dir.path().join("event.json"), PUSH_EVENT).unwrap();
    let config = Config {
        event_name: "issues".into(),
        ..config(dir.path())
    };
    let recorder = Recorder::default();

    let err = run::execute_with(&config, &recorder).await.unwrap_err();
    assert!(format!("{err:#}").starts_with("Failed to read repository info"));
    assert!(recorder.created.lock().unwrap().is_empty());
    assert_eq!(*recorder.attempts.lock().unwrap(), 0);
}

#[tokio::test]
async fn missing_event_file_makes_no_check_run_calls() {
    let dir = workspace(&[("openapi.yaml", VALID.as_bytes())]);
    let recorder = Recorder::default();

    let err = run::execute_with(&config(dir.path()), &recorder).await.unwrap_err();
    assert!(format!("{err:#}").contains("event.json"));
    assert!(recorder.created.lock().unwrap().is_empty());
    assert!(recorder.updates.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ruleset_errors_are_reported_on_the_check() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("openapi.yaml"), VALID).unwrap();
    let recorder = Recorder::default();

    let err = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Ruleset(_)));

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].conclusion, Conclusion::Failure);
    assert_eq!(updates[0].output.summary, err.to_string());
    assert!(updates[0].output.annotations.is_empty());
}

#[tokio::test]
async fn unparsable_documents_fail_the_run() {
    let dir = workspace(&[("broken.yaml", &b"info: [unclosed\n"[..])]);
    let recorder = Recorder::default();

    let err = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Engine { .. }));
    assert_eq!(
        recorder.updates.lock().unwrap()[0].conclusion,
        Conclusion::Failure
    );
}

#[tokio::test]
async fn failed_completion_gets_a_best_effort_failure_update() {
    let dir = workspace(&[("openapi.yaml", VALID.as_bytes())]);
    let recorder = Recorder {
        failing_updates: 1,
        ..Recorder::default()
    };

    let err = pipeline::run_checks(&config(dir.path()), &repository(), &recorder, &Builtins)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Report(_)));

    let updates = recorder.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].conclusion, Conclusion::Failure);
    assert!(updates[0]
        .output
        .summary
        .starts_with("Failed to complete check run: annotation chunk 1 of 1 failed"));
}
