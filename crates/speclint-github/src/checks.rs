//! Creating and completing check runs.

use std::future::Future;

use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::annotation::{Annotation, AnnotationLevel};
use crate::event::RepositoryInfo;

/// GitHub rejects more annotations than this per request.
pub const MAX_ANNOTATIONS_PER_REQUEST: usize = 50;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from talking to the checks API.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The API request failed.
    #[error("failed to {operation} check run: {source}")]
    Api {
        /// `create` or `update`.
        operation: &'static str,
        /// The client error.
        source: BoxError,
    },

    /// One annotation chunk failed; later chunks were not sent.
    #[error("annotation chunk {index} of {total} failed: {source}")]
    Chunk {
        /// 1-based chunk number.
        index: usize,
        /// Number of chunks.
        total: usize,
        /// The underlying failure.
        source: Box<ReportError>,
    },

    /// The completion timestamp could not be formatted.
    #[error("failed to format completion time: {0}")]
    Timestamp(#[from] time::error::Format),
}

/// Check run status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    /// Running.
    InProgress,
    /// Finished.
    Completed,
}

/// Final result of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conclusion {
    /// No failures.
    Success,
    /// Failure-level annotations or an error.
    Failure,
}

/// Body of `POST /repos/{owner}/{repo}/check-runs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCheckRun {
    /// Check name.
    pub name: String,
    /// Commit the check belongs to.
    pub head_sha: String,
    /// Initial status.
    pub status: CheckStatus,
}

/// Body of `PATCH /repos/{owner}/{repo}/check-runs/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheckRun {
    /// Check name.
    pub name: String,
    /// Final status.
    pub status: CheckStatus,
    /// Final result.
    pub conclusion: Conclusion,
    /// RFC 3339 completion time.
    pub completed_at: String,
    /// Rendered output.
    pub output: CheckOutput,
}

/// Output block of a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutput {
    /// Output title.
    pub title: String,
    /// Short summary.
    pub summary: String,
    /// Details.
    pub text: String,
    /// Annotations in this request.
    pub annotations: Vec<Annotation>,
}

/// A check run as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckRun {
    /// Check run id.
    pub id: u64,
}

/// The checks API.
pub trait CheckRuns: Send + Sync {
    /// Creates a check run.
    fn create_check_run(
        &self,
        owner: &str,
        repo: &str,
        body: &CreateCheckRun,
    ) -> impl Future<Output = Result<CheckRun, ReportError>> + Send;

    /// Updates a check run.
    fn update_check_run(
        &self,
        owner: &str,
        repo: &str,
        check_run_id: u64,
        body: &UpdateCheckRun,
    ) -> impl Future<Output = Result<CheckRun, ReportError>> + Send;
}

/// [`CheckRuns`] backed by octocrab.
#[derive(Debug, Clone)]
pub struct OctocrabChecks {
    client: Octocrab,
}

impl OctocrabChecks {
    /// Wraps a client.
    #[must_use]
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

impl CheckRuns for OctocrabChecks {
    async fn create_check_run(
        &self,
        owner: &str,
        repo: &str,
        body: &CreateCheckRun,
    ) -> Result<CheckRun, ReportError> {
        let route = format!("/repos/{owner}/{repo}/check-runs");
        self.client
            .post(route, Some(body))
            .await
            .map_err(|e| ReportError::Api {
                operation: "create",
                source: Box::new(e),
            })
    }

    async fn update_check_run(
        &self,
        owner: &str,
        repo: &str,
        check_run_id: u64,
        body: &UpdateCheckRun,
    ) -> Result<CheckRun, ReportError> {
        let route = format!("/repos/{owner}/{repo}/check-runs/{check_run_id}");
        self.client
            .patch(route, Some(body))
            .await
            .map_err(|e| ReportError::Api {
                operation: "update",
                source: Box::new(e),
            })
    }
}

/// Counts of annotations per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCounts {
    /// Failure-level annotations.
    pub failures: usize,
    /// Warning-level annotations.
    pub warnings: usize,
    /// Notice-level annotations.
    pub notices: usize,
}

impl AnnotationCounts {
    /// Tallies annotations by level.
    #[must_use]
    pub fn of(annotations: &[Annotation]) -> Self {
        annotations.iter().fold(Self::default(), |mut counts, a| {
            match a.annotation_level {
                AnnotationLevel::Failure => counts.failures += 1,
                AnnotationLevel::Warning => counts.warnings += 1,
                AnnotationLevel::Notice => counts.notices += 1,
            }
            counts
        })
    }

    /// Total number of annotations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.failures + self.warnings + self.notices
    }
}

/// Formats `count word`, adding an `s` unless the count is one.
#[must_use]
pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Renders the count line, e.g. `3 problems (1 error, 2 warnings, 0 notices)`.
#[must_use]
pub fn problem_summary(counts: AnnotationCounts) -> String {
    format!(
        "{} ({}, {}, {})",
        pluralize(counts.total(), "problem"),
        pluralize(counts.failures, "error"),
        pluralize(counts.warnings, "warning"),
        pluralize(counts.notices, "notice"),
    )
}

/// The check run summary line.
#[must_use]
pub fn summary_for(conclusion: Conclusion, message: Option<&str>) -> String {
    match (message, conclusion) {
        (Some(message), _) => message.to_string(),
        (None, Conclusion::Success) => "Lint completed successfully".to_string(),
        (None, Conclusion::Failure) => "Lint completed with some errors".to_string(),
    }
}

/// Splits annotations into request-sized chunks.
///
/// An empty list still yields one empty chunk so the run gets completed.
#[must_use]
pub fn chunk_annotations(annotations: &[Annotation]) -> Vec<&[Annotation]> {
    if annotations.is_empty() {
        vec![annotations]
    } else {
        annotations.chunks(MAX_ANNOTATIONS_PER_REQUEST).collect()
    }
}

/// Reports a lint run as a check run on one commit.
pub struct CheckRunReporter<'a, C> {
    client: &'a C,
    repository: &'a RepositoryInfo,
    name: String,
}

impl<'a, C: CheckRuns> CheckRunReporter<'a, C> {
    /// Creates a reporter for the check named `name`.
    pub fn new(client: &'a C, repository: &'a RepositoryInfo, name: impl Into<String>) -> Self {
        Self {
            client,
            repository,
            name: name.into(),
        }
    }

    /// Creates the check run in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create(&self) -> Result<CheckRun, ReportError> {
        let body = CreateCheckRun {
            name: self.name.clone(),
            head_sha: self.repository.sha.clone(),
            status: CheckStatus::InProgress,
        };
        let check_run = self
            .client
            .create_check_run(&self.repository.owner, &self.repository.repo, &body)
            .await?;
        tracing::info!(id = check_run.id, sha = %self.repository.sha, "Created check run");
        Ok(check_run)
    }

    /// Completes the check run, sending annotations in chunks.
    ///
    /// Chunks go out in order; the first failure stops the rest.
    ///
    /// # Errors
    ///
    /// Returns an error if any update call fails.
    pub async fn complete(
        &self,
        check_run_id: u64,
        conclusion: Conclusion,
        annotations: &[Annotation],
        message: Option<&str>,
    ) -> Result<(), ReportError> {
        let completed_at = OffsetDateTime::now_utc().format(&Rfc3339)?;
        let summary = summary_for(conclusion, message);
        let text = problem_summary(AnnotationCounts::of(annotations));

        let chunks = chunk_annotations(annotations);
        let total = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let body = UpdateCheckRun {
                name: self.name.clone(),
                status: CheckStatus::Completed,
                conclusion,
                completed_at: completed_at.clone(),
                output: CheckOutput {
                    title: self.name.clone(),
                    summary: summary.clone(),
                    text: text.clone(),
                    annotations: chunk.to_vec(),
                },
            };
            tracing::debug!(chunk = i + 1, total, annotations = chunk.len(), "Updating check run");
            self.client
                .update_check_run(
                    &self.repository.owner,
                    &self.repository.repo,
                    check_run_id,
                    &body,
                )
                .await
                .map_err(|e| ReportError::Chunk {
                    index: i + 1,
                    total,
                    source: Box::new(e),
                })?;
        }

        tracing::info!(id = check_run_id, ?conclusion, "Completed check run");
        Ok(())
    }
}
