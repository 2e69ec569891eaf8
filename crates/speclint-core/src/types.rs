//! Core types for lint diagnostics and results.

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::path::PathSegment;

/// Severity level for diagnostics, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Hint, purely advisory.
    Hint,
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warn,
    /// Error that must be fixed.
    Error,
}

impl Severity {
    /// Parses a severity name.
    ///
    /// Accepts the canonical names plus the `warning` and `information`
    /// spellings found in older rulesets.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" | "information" => Some(Self::Info),
            "hint" => Some(Self::Hint),
            _ => None,
        }
    }

    /// Maps a numeric severity code (`0` = error through `3` = hint).
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Error),
            1 => Some(Self::Warn),
            2 => Some(Self::Info),
            3 => Some(Self::Hint),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hint => write!(f, "hint"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A position in a document. Both fields are 0-indexed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed).
    pub line: usize,
    /// Character offset within the line (0-indexed).
    pub character: usize,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

/// A source range between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start of the range.
    pub start: Position,
    /// End of the range.
    pub end: Position,
}

impl Range {
    /// Creates a new range.
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Creates a range spanning `start_line:start_char` to `end_line:end_char`.
    #[must_use]
    pub fn from_coords(
        start_line: usize,
        start_char: usize,
        end_line: usize,
        end_char: usize,
    ) -> Self {
        Self::new(
            Position::new(start_line, start_char),
            Position::new(end_line, end_char),
        )
    }

    /// Returns true if the range starts and ends on the same line.
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }
}

/// A finding produced by the engine for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule name that produced this diagnostic (e.g., "info-contact").
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Location of the offending node inside the document.
    pub path: Vec<PathSegment>,
    /// Source range of the offending node.
    pub range: Range,
    /// File the diagnostic belongs to, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Diagnostic {
    /// Creates a new diagnostic.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        range: Range,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            path: Vec::new(),
            range,
            source: None,
        }
    }

    /// Sets the document path of this diagnostic.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Sets the source file of this diagnostic.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the document path in dotted form (e.g., `paths./pets.get`).
    #[must_use]
    pub fn path_string(&self) -> String {
        crate::path::join_segments(&self.path)
    }

    /// Formats the diagnostic for terminal output.
    ///
    /// `severity_label` is printed in place of the severity name, so callers
    /// can colour it.
    #[must_use]
    pub fn format(&self, severity_label: &str) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} at {}:{}:{}\n",
            self.code,
            self.source_display(),
            self.range.start.line + 1,
            self.range.start.character + 1,
        );
        let _ = writeln!(output, "  {severity_label}: {}", self.message);
        if !self.path.is_empty() {
            let _ = writeln!(output, "  = path: {}", self.path_string());
        }
        output
    }

    fn source_display(&self) -> String {
        self.source
            .as_ref()
            .map_or_else(|| "<input>".to_string(), |p| p.display().to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.source_display(),
            self.range.start.line + 1,
            self.range.start.character + 1,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Converts a [`Diagnostic`] to a miette diagnostic for rich terminal display.
#[derive(Debug, thiserror::Error, MietteDiagnostic)]
#[error("[{code}] {message}")]
pub struct DiagnosticReport {
    code: String,
    message: String,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    label: String,
    #[help]
    help: Option<String>,
}

impl DiagnosticReport {
    /// Builds a report for `diagnostic` against the document it was produced from.
    #[must_use]
    pub fn new(diagnostic: &Diagnostic, name: &str, content: &str) -> Self {
        let start = offset_for(content, diagnostic.range.start);
        let end = if diagnostic.range.is_single_line() {
            offset_for(content, diagnostic.range.end).max(start)
        } else {
            start
        };
        Self {
            code: diagnostic.code.clone(),
            message: diagnostic.message.clone(),
            source_code: NamedSource::new(name, content.to_string()),
            span: SourceSpan::from((start, end - start)),
            label: diagnostic.severity.to_string(),
            help: (!diagnostic.path.is_empty())
                .then(|| format!("at path `{}`", diagnostic.path_string())),
        }
    }
}

/// Calculates the byte offset of a 0-indexed position.
///
/// Out-of-range lines clamp to the end of the content; out-of-range
/// characters clamp to the end of the line.
#[must_use]
pub fn offset_for(content: &str, position: Position) -> usize {
    let mut offset = 0;
    for (i, line) in content.split_inclusive('\n').enumerate() {
        if i == position.line {
            let text = line.trim_end_matches(['\n', '\r']);
            let column = text
                .char_indices()
                .nth(position.character)
                .map_or(text.len(), |(idx, _)| idx);
            return offset + column;
        }
        offset += line.len();
    }
    content.len()
}

/// Diagnostic totals grouped by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    /// Number of error diagnostics.
    pub errors: usize,
    /// Number of warning diagnostics.
    pub warnings: usize,
    /// Number of info diagnostics.
    pub infos: usize,
    /// Number of hint diagnostics.
    pub hints: usize,
}

/// Result of linting a set of documents.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics found.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files checked.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Counts diagnostics by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for diagnostic in &self.diagnostics {
            match diagnostic.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warn => counts.warnings += 1,
                Severity::Info => counts.infos += 1,
                Severity::Hint => counts.hints += 1,
            }
        }
        counts
    }

    /// Adds diagnostics from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.files_checked += other.files_checked;
    }
}
