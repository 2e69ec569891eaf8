//! Finding and reading the documents to lint.

use futures_util::future::join_all;
use std::path::{Path, PathBuf};

/// A document read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWithContent {
    /// Absolute (or base-joined) path.
    pub path: PathBuf,
    /// File text.
    pub content: String,
}

/// Errors from expanding the file glob.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The pattern is malformed.
    #[error("invalid file glob `{pattern}`: {source}")]
    Pattern {
        /// The pattern as expanded.
        pattern: String,
        /// The glob error.
        source: glob::PatternError,
    },
}

/// Expands `pattern` under `base_dir`.
///
/// Relative patterns are joined onto `base_dir`, which is matched
/// literally even if it contains glob metacharacters. Directories and
/// entries that cannot be inspected are skipped.
///
/// # Errors
///
/// Returns an error if the pattern is malformed.
pub fn discover(pattern: &str, base_dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        let base = glob::Pattern::escape(&base_dir.to_string_lossy());
        Path::new(&base).join(pattern).to_string_lossy().into_owned()
    };

    let entries = glob::glob(&full).map_err(|e| DiscoveryError::Pattern {
        pattern: full.clone(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_dir() => {}
            Ok(path) => paths.push(path),
            Err(e) => tracing::warn!("Skipping {}: {}", e.path().display(), e.error()),
        }
    }

    if paths.is_empty() {
        tracing::warn!("No files matched {full}");
    } else {
        tracing::info!("Found {} file(s) matching {full}", paths.len());
    }
    Ok(paths)
}

/// Reads every file concurrently, dropping the ones that fail.
///
/// Order follows `paths`.
pub async fn read_all(paths: Vec<PathBuf>) -> Vec<FileWithContent> {
    let reads = paths.into_iter().map(|path| async move {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                tracing::debug!("Read {}", path.display());
                Some(FileWithContent { path, content })
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable file {}: {e}", path.display());
                None
            }
        }
    });
    join_all(reads).await.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn relative_patterns_join_base() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("api")).unwrap();
        fs::write(dir.path().join("api/openapi.yaml"), "openapi: 3.0.0\n").unwrap();
        fs::write(dir.path().join("README.md"), "# api\n").unwrap();

        let paths = discover("**/*.yaml", dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("api/openapi.yaml")]);
    }

    #[test]
    fn base_dir_metacharacters_are_literal() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("repo[1]");
        fs::create_dir_all(base.join("api")).unwrap();
        fs::write(base.join("api/openapi.yaml"), "openapi: 3.0.0\n").unwrap();
        fs::write(dir.path().join("repo1"), "").unwrap();

        let paths = discover("**/*.yaml", &base).unwrap();
        assert_eq!(paths, vec![base.join("api/openapi.yaml")]);

        let base = dir.path().join("specs*?");
        fs::create_dir(&base).unwrap();
        fs::write(base.join("a.yaml"), "a: 1\n").unwrap();
        assert_eq!(discover("*.yaml", &base).unwrap(), vec![base.join("a.yaml")]);
    }

    #[test]
    fn directories_are_skipped() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("specs.yaml")).unwrap();
        fs::write(dir.path().join("a.yaml"), "a: 1\n").unwrap();

        let paths = discover("*.yaml", dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("a.yaml")]);
    }

    #[test]
    fn absolute_patterns_are_used_verbatim() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        let pattern = format!("{}/*.json", dir.path().display());

        let paths = discover(&pattern, Path::new("/nonexistent")).unwrap();
        assert_eq!(paths, vec![dir.path().join("a.json")]);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let err = discover("[", Path::new("/tmp")).unwrap_err();
        assert!(matches!(err, DiscoveryError::Pattern { .. }));
    }

    #[test]
    fn no_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover("*.yaml", dir.path()).unwrap().is_empty());
    }
}
