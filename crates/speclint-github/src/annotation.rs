//! Check-run annotations built from diagnostics.

use serde::{Deserialize, Serialize};
use speclint_core::{Diagnostic, Severity};
use std::path::{Component, Path};

/// Annotation level understood by the checks API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationLevel {
    /// Informational.
    Notice,
    /// Should be addressed.
    Warning,
    /// Fails the check run.
    Failure,
}

impl From<Severity> for AnnotationLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::Failure,
            Severity::Warn => Self::Warning,
            Severity::Info | Severity::Hint => Self::Notice,
        }
    }
}

/// A line-scoped comment attached to a check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// File path relative to the repository root, `/`-separated.
    pub path: String,
    /// First line (1-based).
    pub start_line: usize,
    /// Last line (1-based).
    pub end_line: usize,
    /// First column (1-based), only for single-line annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_column: Option<usize>,
    /// Last column (1-based), only for single-line annotations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    /// Severity of the annotation.
    pub annotation_level: AnnotationLevel,
    /// Diagnostic message.
    pub message: String,
    /// Rule code.
    pub title: String,
}

impl Annotation {
    /// Builds an annotation for a diagnostic found in `file_path`.
    ///
    /// `file_path` is made relative to `base_path` when it lies under it.
    #[must_use]
    pub fn from_diagnostic(diagnostic: &Diagnostic, base_path: &Path, file_path: &Path) -> Self {
        let range = diagnostic.range;
        let (start_column, end_column) = if range.is_single_line() {
            (Some(range.start.character + 1), Some(range.end.character + 1))
        } else {
            (None, None)
        };

        Self {
            path: relative_path(base_path, file_path),
            start_line: range.start.line + 1,
            end_line: range.end.line + 1,
            start_column,
            end_column,
            annotation_level: diagnostic.severity.into(),
            message: diagnostic.message.clone(),
            title: diagnostic.code.clone(),
        }
    }
}

/// Returns `file_path` relative to `base_path` with `/` separators.
#[must_use]
pub fn relative_path(base_path: &Path, file_path: &Path) -> String {
    let relative = file_path.strip_prefix(base_path).unwrap_or(file_path);
    relative
        .components()
        .map(|c| match c {
            Component::RootDir => "".into(),
            other => other.as_os_str().to_string_lossy(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Sorts annotations by start line, keeping the order of ties.
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by_key(|a| a.start_line);
}

/// Returns true if any annotation fails the check run.
#[must_use]
pub fn has_failures(annotations: &[Annotation]) -> bool {
    annotations
        .iter()
        .any(|a| a.annotation_level == AnnotationLevel::Failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use speclint_core::Range;

    fn diagnostic(severity: Severity, range: Range) -> Diagnostic {
        Diagnostic::new("info-contact", "`contact` property must be truthy", severity, range)
    }

    #[test]
    fn severity_mapping_is_total() {
        assert_eq!(AnnotationLevel::from(Severity::Error), AnnotationLevel::Failure);
        assert_eq!(AnnotationLevel::from(Severity::Warn), AnnotationLevel::Warning);
        assert_eq!(AnnotationLevel::from(Severity::Info), AnnotationLevel::Notice);
        assert_eq!(AnnotationLevel::from(Severity::Hint), AnnotationLevel::Notice);
    }

    #[test]
    fn single_line_ranges_have_columns() {
        let d = diagnostic(Severity::Error, Range::from_coords(3, 2, 3, 9));
        let a = Annotation::from_diagnostic(
            &d,
            Path::new("/work"),
            Path::new("/work/api/openapi.yaml"),
        );
        assert_eq!(a.path, "api/openapi.yaml");
        assert_eq!((a.start_line, a.end_line), (4, 4));
        assert_eq!((a.start_column, a.end_column), (Some(3), Some(10)));
        assert_eq!(a.annotation_level, AnnotationLevel::Failure);
        assert_eq!(a.title, "info-contact");
    }

    #[test]
    fn multi_line_ranges_omit_columns() {
        let d = diagnostic(Severity::Warn, Range::from_coords(1, 0, 4, 2));
        let a =
            Annotation::from_diagnostic(&d, Path::new("/work"), Path::new("/work/openapi.yaml"));
        assert_eq!((a.start_line, a.end_line), (2, 5));
        assert_eq!((a.start_column, a.end_column), (None, None));

        let json = serde_json::to_value(&a).unwrap();
        assert!(json.get("start_column").is_none());
        assert_eq!(json["annotation_level"], "warning");
    }

    #[test]
    fn paths_outside_base_are_kept() {
        assert_eq!(
            relative_path(Path::new("/work"), Path::new("/other/spec.yaml")),
            "/other/spec.yaml"
        );
    }

    #[test]
    fn sort_is_stable_by_start_line() {
        let make = |line: usize, title: &str| {
            let mut d = diagnostic(Severity::Info, Range::from_coords(line, 0, line, 1));
            d.code = title.to_string();
            Annotation::from_diagnostic(&d, Path::new("/"), Path::new("/a.yaml"))
        };
        let mut annotations = vec![make(5, "a"), make(1, "b"), make(5, "c"), make(1, "d")];
        sort_annotations(&mut annotations);
        let titles: Vec<&str> = annotations.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d", "a", "c"]);
    }
}
