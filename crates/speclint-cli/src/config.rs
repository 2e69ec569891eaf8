//! Action configuration decoded from the environment.
//!
//! Every input is validated up front; decoding reports all failing
//! fields at once rather than stopping at the first.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

const EVENT_PATH: &str = "GITHUB_EVENT_PATH";
const REPO_TOKEN: &str = "INPUT_REPO_TOKEN";
const WORKSPACE: &str = "GITHUB_WORKSPACE";
const FILE_GLOB: &str = "INPUT_FILE_GLOB";
const EVENT_NAME: &str = "INPUT_EVENT_NAME";
const RULESET: &str = "INPUT_RULESET";
const LEGACY_RULESET: &str = "INPUT_SPECTRAL_RULESET";
const SERVER_URL: &str = "GITHUB_SERVER_URL";
const API_URL: &str = "GITHUB_API_URL";
const CHECK_NAME: &str = "INPUT_CHECK_NAME";
const RUNNER_DEBUG: &str = "RUNNER_DEBUG";

/// Check name used when `INPUT_CHECK_NAME` is unset or empty.
pub const DEFAULT_CHECK_NAME: &str = "speclint";

/// One field that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The variable is not set.
    Missing(&'static str),
    /// The variable is set but its value is unusable.
    Invalid {
        /// Variable name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "{name}: required but not set"),
            Self::Invalid { name, reason } => write!(f, "{name}: {reason}"),
        }
    }
}

/// Errors from decoding the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One or more fields failed to decode.
    #[error("invalid configuration:\n{}", format_errors(.0))]
    Invalid(Vec<FieldError>),
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validated action configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path of the workflow event payload.
    pub event_path: PathBuf,
    /// Token used for the checks API.
    pub repo_token: String,
    /// Checked-out repository root.
    pub workspace: PathBuf,
    /// Glob selecting the documents to lint.
    pub file_glob: String,
    /// Name of the triggering event.
    pub event_name: String,
    /// Ruleset reference; empty means default file discovery.
    pub ruleset: String,
    /// Web URL of the GitHub server.
    pub server_url: String,
    /// Explicit REST API base URL.
    pub api_url: Option<String>,
    /// Name of the check run.
    pub check_name: String,
    /// Debug logging requested by the runner.
    pub debug: bool,
}

impl Config {
    /// Decodes the process environment.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Decodes a set of variables.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing or invalid.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> =
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let mut errors = Vec::new();

        let mut non_empty = |name: &'static str| -> String {
            match vars.get(name) {
                None => {
                    errors.push(FieldError::Missing(name));
                    String::new()
                }
                Some(value) if value.trim().is_empty() => {
                    errors.push(FieldError::Invalid {
                        name,
                        reason: "must not be empty".to_string(),
                    });
                    String::new()
                }
                Some(value) => value.clone(),
            }
        };

        let event_path = non_empty(EVENT_PATH);
        let repo_token = non_empty(REPO_TOKEN);
        let workspace = non_empty(WORKSPACE);
        let file_glob = non_empty(FILE_GLOB);
        let event_name = non_empty(EVENT_NAME);
        let server_url = non_empty(SERVER_URL);

        let ruleset = match vars.get(RULESET).or_else(|| vars.get(LEGACY_RULESET)) {
            Some(value) => value.trim().to_string(),
            None => {
                errors.push(FieldError::Missing(RULESET));
                String::new()
            }
        };

        if !server_url.is_empty()
            && !(server_url.starts_with("https://") || server_url.starts_with("http://"))
        {
            errors.push(FieldError::Invalid {
                name: SERVER_URL,
                reason: format!("`{server_url}` is not an http(s) URL"),
            });
        }

        let debug = match vars.get(RUNNER_DEBUG) {
            None => false,
            Some(value) => parse_bool(value).unwrap_or_else(|| {
                errors.push(FieldError::Invalid {
                    name: RUNNER_DEBUG,
                    reason: format!("`{value}` is not a boolean"),
                });
                false
            }),
        };

        let api_url = vars
            .get(API_URL)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let check_name = vars
            .get(CHECK_NAME)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_CHECK_NAME.to_string());

        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        Ok(Self {
            event_path: PathBuf::from(event_path),
            repo_token,
            workspace: PathBuf::from(workspace),
            file_glob,
            event_name,
            ruleset,
            server_url,
            api_url,
            check_name,
            debug,
        })
    }

    /// Returns the REST API base URL.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        speclint_github::api_base_url(&self.server_url, self.api_url.as_deref())
    }
}

/// Parses `true/false/1/0/yes/no`, case-insensitively.
#[must_use]
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            (EVENT_PATH, "/github/workflow/event.json"),
            (REPO_TOKEN, "secret"),
            (WORKSPACE, "/github/workspace"),
            (FILE_GLOB, "**/*.yaml"),
            (EVENT_NAME, "pull_request"),
            (RULESET, ""),
            (SERVER_URL, "https://github.com"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars = base_vars();
        vars.retain(|(k, _)| !extra.iter().any(|(e, _)| e == k));
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn decodes_required_fields_with_defaults() {
        let config = Config::from_vars(base_vars()).unwrap();
        assert_eq!(config.event_path, PathBuf::from("/github/workflow/event.json"));
        assert_eq!(config.ruleset, "");
        assert_eq!(config.check_name, DEFAULT_CHECK_NAME);
        assert!(!config.debug);
        assert_eq!(config.api_base_url(), "https://api.github.com");
    }

    #[test]
    fn decoding_is_idempotent() {
        assert_eq!(
            Config::from_vars(base_vars()).unwrap(),
            Config::from_vars(base_vars()).unwrap()
        );
    }

    #[test]
    fn reports_every_failing_field() {
        let vars = vec![(REPO_TOKEN, ""), (SERVER_URL, "github.com")];
        let ConfigError::Invalid(errors) = Config::from_vars(vars).unwrap_err();
        assert!(errors.contains(&FieldError::Missing(EVENT_PATH)));
        assert!(errors.contains(&FieldError::Missing(WORKSPACE)));
        assert!(errors.contains(&FieldError::Missing(FILE_GLOB)));
        assert!(errors.contains(&FieldError::Missing(EVENT_NAME)));
        assert!(errors.contains(&FieldError::Missing(RULESET)));
        let invalid = |field: &str| {
            errors
                .iter()
                .any(|e| matches!(e, FieldError::Invalid { name, .. } if *name == field))
        };
        assert!(invalid(REPO_TOKEN));
        assert!(invalid(SERVER_URL));
        assert_eq!(errors.len(), 7);
    }

    #[test]
    fn legacy_ruleset_input_is_accepted() {
        let mut vars = base_vars();
        vars.retain(|(k, _)| *k != RULESET);
        vars.push((LEGACY_RULESET, ".spectral.yml"));
        assert_eq!(Config::from_vars(vars).unwrap().ruleset, ".spectral.yml");
    }

    #[test]
    fn optional_fields() {
        let config = Config::from_vars(with(&[
            (SERVER_URL, "https://git.example.com"),
            (CHECK_NAME, "API lint"),
            (RUNNER_DEBUG, "1"),
        ]))
        .unwrap();
        assert_eq!(config.check_name, "API lint");
        assert!(config.debug);
        assert_eq!(config.api_base_url(), "https://git.example.com/api/v3");

        let config = Config::from_vars(with(&[(API_URL, "https://api.example.com")])).unwrap();
        assert_eq!(config.api_base_url(), "https://api.example.com");
    }

    #[test]
    fn invalid_boolean_is_reported() {
        let ConfigError::Invalid(errors) =
            Config::from_vars(with(&[(RUNNER_DEBUG, "maybe")])).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::Invalid {
                name: RUNNER_DEBUG,
                reason: "`maybe` is not a boolean".to_string(),
            }]
        );
    }

    #[test]
    fn booleans() {
        for value in ["true", "TRUE", "1", "yes", "Yes"] {
            assert_eq!(parse_bool(value), Some(true), "{value}");
        }
        for value in ["false", "0", "no", "NO"] {
            assert_eq!(parse_bool(value), Some(false), "{value}");
        }
        assert_eq!(parse_bool("on"), None);
    }

    #[test]
    fn error_lists_fields() {
        let err = Config::from_vars(Vec::<(String, String)>::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "invalid configuration:\n  - GITHUB_EVENT_PATH: required but not set"
        ));
    }
}
