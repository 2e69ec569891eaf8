//! Reading the workflow event payload.

use serde_json::Value;
use std::path::{Path, PathBuf};

/// Errors from reading the event payload.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The payload file could not be read.
    #[error("failed to read event payload {}: {source}", path.display())]
    Io {
        /// Payload file.
        path: PathBuf,
        /// The I/O error.
        source: std::io::Error,
    },

    /// The payload is not valid JSON.
    #[error("event payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent or not a string.
    #[error("event payload is missing `{0}`")]
    MissingField(String),

    /// The event kind has no known commit sha location.
    #[error("unsupported event `{0}`, expected: pull_request, push")]
    UnsupportedEvent(String),
}

/// The repository and commit a run reports against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryInfo {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Event that triggered the run.
    pub event_name: String,
    /// Commit the check run is attached to.
    pub sha: String,
}

impl RepositoryInfo {
    /// Reads and parses the payload file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if it lacks
    /// a required field for `event_name`.
    pub async fn from_event_file(path: &Path, event_name: &str) -> Result<Self, EventError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| EventError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_payload(&content, event_name)
    }

    /// Parses a payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not JSON, the event is unsupported,
    /// or a required field is missing.
    pub fn from_payload(json: &str, event_name: &str) -> Result<Self, EventError> {
        let sha_pointer = match event_name {
            "pull_request" => "/pull_request/head/sha",
            "push" => "/after",
            other => return Err(EventError::UnsupportedEvent(other.to_string())),
        };

        let payload: Value = serde_json::from_str(json)?;
        let owner = string_at(&payload, "/repository/owner/login")?;
        let repo = string_at(&payload, "/repository/name")?;
        let sha = string_at(&payload, sha_pointer)?;

        tracing::debug!(%owner, %repo, %sha, event = event_name, "Read event payload");
        Ok(Self {
            owner,
            repo,
            event_name: event_name.to_string(),
            sha,
        })
    }
}

fn string_at(payload: &Value, pointer: &str) -> Result<String, EventError> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| {
            EventError::MissingField(pointer.trim_start_matches('/').replace('/', "."))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PULL_REQUEST: &str = r#"{
        "repository": {"name": "pets", "owner": {"login": "acme"}},
        "pull_request": {"head": {"sha": "abc123"}},
        "after": "ignored"
    }"#;

    #[test]
    fn pull_request_uses_head_sha() {
        let info = RepositoryInfo::from_payload(PULL_REQUEST, "pull_request").unwrap();
        assert_eq!(
            info,
            RepositoryInfo {
                owner: "acme".into(),
                repo: "pets".into(),
                event_name: "pull_request".into(),
                sha: "abc123".into(),
            }
        );
    }

    #[test]
    fn push_uses_after() {
        let json = r#"{
            "repository": {"name": "pets", "owner": {"login": "acme"}},
            "after": "def456"
        }"#;
        let info = RepositoryInfo::from_payload(json, "push").unwrap();
        assert_eq!(info.sha, "def456");
    }

    #[test]
    fn unsupported_event() {
        let err = RepositoryInfo::from_payload(PULL_REQUEST, "workflow_dispatch").unwrap_err();
        assert!(matches!(
            err,
            EventError::UnsupportedEvent(ref name) if name == "workflow_dispatch"
        ));
    }

    #[test]
    fn missing_field_names_the_path() {
        let json = r#"{"repository": {"name": "pets", "owner": {}}, "after": "x"}"#;
        let err = RepositoryInfo::from_payload(json, "push").unwrap_err();
        assert_eq!(err.to_string(), "event payload is missing `repository.owner.login`");
    }

    #[test]
    fn invalid_json() {
        let err = RepositoryInfo::from_payload("{not json", "push").unwrap_err();
        assert!(matches!(err, EventError::Json(_)));
    }
}
