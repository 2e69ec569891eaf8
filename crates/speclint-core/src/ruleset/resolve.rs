//! Locating, fetching and flattening rulesets.
//!
//! A ruleset reference is one of three things: a built-in name
//! (`speclint:oas`), a remote URL, or a path on disk. [`RulesetResolver`]
//! loads the text for each, follows `extends` chains and hands the
//! result to the loader.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use url::Url;

use super::dto;
use super::loader::{self, ExtendsMode, LoadError};
use super::migrate;
use super::model::Ruleset;

/// Files probed, in order, when no ruleset is configured.
pub const DEFAULT_RULESET_FILES: &[&str] = &[
    ".speclint.yaml",
    ".speclint.yml",
    ".speclint.json",
    ".spectral.yaml",
    ".spectral.yml",
    ".spectral.json",
];

const BUILTIN_PREFIX: &str = "speclint:";
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from locating or resolving a ruleset.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No ruleset was configured and no default file exists.
    #[error(
        "no ruleset has been found in {}; provide one with the `ruleset` input or add one of: {}",
        dir.display(),
        DEFAULT_RULESET_FILES.join(", ")
    )]
    NotFound {
        /// Directory that was searched.
        dir: PathBuf,
    },

    /// The ruleset is a script, which cannot be evaluated.
    #[error("{location}: executable rulesets are not supported, convert it to YAML or JSON")]
    Executable {
        /// The offending reference.
        location: String,
    },

    /// A `speclint:` name that no built-in provides.
    #[error("unknown built-in ruleset `{name}`")]
    UnknownBuiltin {
        /// The requested name.
        name: String,
    },

    /// A reference that looked like a URL but did not parse.
    #[error("invalid ruleset URL `{reference}`: {source}")]
    InvalidUrl {
        /// The reference as written.
        reference: String,
        /// The parse error.
        source: url::ParseError,
    },

    /// A local ruleset could not be read.
    #[error("failed to read ruleset {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// The I/O error.
        source: std::io::Error,
    },

    /// A remote ruleset could not be fetched.
    #[error("failed to fetch ruleset {url}: {source}")]
    Fetch {
        /// URL that failed.
        url: Url,
        /// The HTTP error.
        source: reqwest::Error,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Ruleset text is not valid YAML/JSON or has the wrong shape.
    #[error("failed to parse ruleset {location}: {source}")]
    Parse {
        /// Where the ruleset came from.
        location: String,
        /// The deserialization error.
        source: serde_yaml::Error,
    },

    /// An `extends` entry carries an unknown mode.
    #[error("{location}: unknown extends mode `{mode}`, expected: recommended, all, off")]
    InvalidMode {
        /// Where the ruleset came from.
        location: String,
        /// The invalid mode.
        mode: String,
    },

    /// The ruleset parsed but failed validation.
    #[error("invalid ruleset {location}: {source}")]
    Load {
        /// Where the ruleset came from.
        location: String,
        /// The validation error.
        source: LoadError,
    },

    /// `extends` chains loop back on themselves.
    #[error("ruleset extends cycle: {}", chain.join(" -> "))]
    Cycle {
        /// The chain of references, ending with the repeated one.
        chain: Vec<String>,
    },
}

/// Where a ruleset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesetLocator {
    /// A ruleset compiled into the binary, by name (e.g., `speclint:oas`).
    Builtin(String),
    /// A file on disk (absolute).
    Local(PathBuf),
    /// A file fetched over HTTP(S).
    Remote(Url),
}

impl RulesetLocator {
    /// Classifies a ruleset reference.
    ///
    /// Relative paths are resolved against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed URLs and script rulesets.
    pub fn parse(reference: &str, base_dir: &Path) -> Result<Self, ResolveError> {
        let reference = reference.trim();
        if let Some(name) = migrate::builtin_alias(reference) {
            return Ok(Self::Builtin(name.to_string()));
        }
        if reference.starts_with(BUILTIN_PREFIX) {
            return Ok(Self::Builtin(reference.to_string()));
        }

        let locator = if reference.starts_with("http://") || reference.starts_with("https://") {
            Url::parse(reference)
                .map(Self::Remote)
                .map_err(|e| ResolveError::InvalidUrl {
                    reference: reference.to_string(),
                    source: e,
                })?
        } else {
            Self::Local(base_dir.join(reference))
        };
        locator.reject_executable()
    }

    /// Classifies an `extends` entry relative to the ruleset that references it.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed URLs and script rulesets.
    pub fn relative_to(
        reference: &str,
        parent: &Self,
        workspace: &Path,
    ) -> Result<Self, ResolveError> {
        let is_absolute_ref = reference.starts_with(BUILTIN_PREFIX)
            || migrate::builtin_alias(reference).is_some()
            || reference.starts_with("http://")
            || reference.starts_with("https://");
        if is_absolute_ref {
            return Self::parse(reference, workspace);
        }

        match parent {
            Self::Remote(url) => url
                .join(reference)
                .map(Self::Remote)
                .map_err(|e| ResolveError::InvalidUrl {
                    reference: reference.to_string(),
                    source: e,
                })?
                .reject_executable(),
            Self::Local(path) => {
                let dir = path.parent().unwrap_or(workspace);
                Self::parse(reference, dir)
            }
            Self::Builtin(_) => Self::parse(reference, workspace),
        }
    }

    fn reject_executable(self) -> Result<Self, ResolveError> {
        let name = match &self {
            Self::Builtin(_) => return Ok(self),
            Self::Local(path) => path.to_string_lossy().into_owned(),
            Self::Remote(url) => url.path().to_string(),
        };
        let is_script = [".js", ".mjs", ".cjs"].iter().any(|ext| name.ends_with(ext));
        if is_script {
            Err(ResolveError::Executable {
                location: self.to_string(),
            })
        } else {
            Ok(self)
        }
    }
}

impl fmt::Display for RulesetLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) => f.write_str(name),
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Returns the first default ruleset file present in `dir`.
pub async fn default_ruleset_file(dir: &Path) -> Option<PathBuf> {
    for name in DEFAULT_RULESET_FILES {
        let path = dir.join(name);
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_file()) {
            return Some(path);
        }
    }
    None
}

/// Turns the configured ruleset input into a locator.
///
/// An empty input falls back to [`default_ruleset_file`] in `workspace`.
///
/// # Errors
///
/// Returns [`ResolveError::NotFound`] when the input is empty and no
/// default file exists, or any error from [`RulesetLocator::parse`].
pub async fn locate(input: &str, workspace: &Path) -> Result<RulesetLocator, ResolveError> {
    if input.trim().is_empty() {
        let path = default_ruleset_file(workspace)
            .await
            .ok_or_else(|| ResolveError::NotFound {
                dir: workspace.to_path_buf(),
            })?;
        return RulesetLocator::Local(path).reject_executable();
    }
    RulesetLocator::parse(input, workspace)
}

/// Source of rulesets compiled into the binary.
pub trait BuiltinRulesets: Send + Sync {
    /// Returns the ruleset text for a built-in name.
    fn source(&self, name: &str) -> Option<&'static str>;
}

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<Ruleset, ResolveError>> + Send + 'a>>;

/// Loads rulesets and flattens their `extends` chains.
pub struct RulesetResolver<'a> {
    builtins: &'a dyn BuiltinRulesets,
    http: reqwest::Client,
    workspace: PathBuf,
}

impl<'a> RulesetResolver<'a> {
    /// Creates a resolver. Relative references resolve against `workspace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        builtins: &'a dyn BuiltinRulesets,
        workspace: impl Into<PathBuf>,
    ) -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("speclint/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ResolveError::Client)?;
        Ok(Self {
            builtins,
            http,
            workspace: workspace.into(),
        })
    }

    /// Resolves a ruleset and everything it extends.
    ///
    /// # Errors
    ///
    /// Returns the first error from reading, parsing, validating or
    /// following `extends`.
    pub async fn resolve(&self, locator: &RulesetLocator) -> Result<Ruleset, ResolveError> {
        tracing::info!(ruleset = %locator, "Loading ruleset");
        self.resolve_inner(locator.clone(), Vec::new()).await
    }

    fn resolve_inner(
        &self,
        locator: RulesetLocator,
        mut stack: Vec<RulesetLocator>,
    ) -> ResolveFuture<'_> {
        Box::pin(async move {
            if stack.contains(&locator) {
                let mut chain: Vec<String> = stack.iter().map(ToString::to_string).collect();
                chain.push(locator.to_string());
                return Err(ResolveError::Cycle { chain });
            }

            let location = locator.to_string();
            let text = self.read(&locator).await?;
            let parsed = dto::parse(&text).map_err(|e| ResolveError::Parse {
                location: location.clone(),
                source: e,
            })?;
            let mut parsed = migrate::migrate(parsed).map_err(|e| ResolveError::Load {
                location: location.clone(),
                source: e,
            })?;

            let entries = parsed
                .extends
                .take()
                .map(dto::ExtendsDto::into_entries)
                .unwrap_or_default();
            stack.push(locator.clone());

            let mut parents = Vec::with_capacity(entries.len());
            for entry in entries {
                let mode = match entry.mode() {
                    None => ExtendsMode::default(),
                    Some(mode) => {
                        ExtendsMode::parse(mode).ok_or_else(|| ResolveError::InvalidMode {
                            location: location.clone(),
                            mode: mode.to_string(),
                        })?
                    }
                };
                let child =
                    RulesetLocator::relative_to(entry.reference(), &locator, &self.workspace)?;
                tracing::debug!(parent = %location, child = %child, ?mode, "Following extends");
                let ruleset = self.resolve_inner(child, stack.clone()).await?;
                parents.push((ruleset, mode));
            }

            loader::load(parsed, parents).map_err(|e| ResolveError::Load { location, source: e })
        })
    }

    async fn read(&self, locator: &RulesetLocator) -> Result<String, ResolveError> {
        match locator {
            RulesetLocator::Builtin(name) => self
                .builtins
                .source(name)
                .map(String::from)
                .ok_or_else(|| ResolveError::UnknownBuiltin { name: name.clone() }),
            RulesetLocator::Local(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| ResolveError::Io {
                        path: path.clone(),
                        source: e,
                    })
            }
            RulesetLocator::Remote(url) => {
                let fetch = |e| ResolveError::Fetch {
                    url: url.clone(),
                    source: e,
                };
                self.http
                    .get(url.clone())
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map_err(fetch)?
                    .text()
                    .await
                    .map_err(fetch)
            }
        }
    }
}
