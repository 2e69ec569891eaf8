//! Rule evaluation against a single document.

use std::collections::HashSet;

use marked_yaml::types::MarkedScalarNode;
use marked_yaml::Node;

use crate::document::{self, Document, DocumentError};
use crate::functions::Value;
use crate::path::{Match, PathSegment, Target};
use crate::ruleset::{Field, Rule, Ruleset, Then};
use crate::types::{Diagnostic, Range};

/// Errors that abort linting a document.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The document could not be parsed.
    #[error("failed to parse document: {0}")]
    Parse(#[from] DocumentError),
}

/// Lints document text and returns its diagnostics.
///
/// Implementations are immutable and shared across files.
pub trait LintEngine: Send + Sync {
    /// Lints one document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed.
    fn run(&self, source: &str) -> Result<Vec<Diagnostic>, EngineError>;
}

/// The declarative rule engine.
#[derive(Debug, Clone)]
pub struct Engine {
    ruleset: Ruleset,
}

impl Engine {
    /// Creates an engine for a resolved ruleset.
    #[must_use]
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }

    /// Returns the ruleset this engine runs.
    #[must_use]
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }
}

impl LintEngine for Engine {
    fn run(&self, source: &str) -> Result<Vec<Diagnostic>, EngineError> {
        let document = Document::parse(source)?;
        let formats = document.formats();

        let mut diagnostics = Vec::new();
        for rule in self.ruleset.enabled_rules() {
            if !rule.applies_to(formats) {
                continue;
            }
            for given in rule.given() {
                for matched in given.evaluate(document.root()) {
                    for then in rule.then() {
                        if let Some(diagnostic) = check(rule, then, &matched) {
                            diagnostics.push(diagnostic);
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        diagnostics.retain(|d| seen.insert((d.code.clone(), d.path.clone(), d.message.clone())));
        diagnostics.sort_by(|a, b| {
            a.range
                .start
                .cmp(&b.range.start)
                .then_with(|| a.code.cmp(&b.code))
        });
        tracing::debug!(count = diagnostics.len(), "Document linted");
        Ok(diagnostics)
    }
}

/// The value a `then` resolved to, with where to report it.
struct Resolved<'a> {
    value: Value<'a>,
    path: Vec<PathSegment>,
    range: Range,
    property: String,
}

fn check(rule: &Rule, then: &Then, matched: &Match<'_>) -> Option<Diagnostic> {
    let resolved = resolve_field(matched, then.field.as_ref());
    let error = then.function.evaluate(resolved.value, &resolved.property)?;

    let message = render_message(rule, &error, &resolved);
    Some(
        Diagnostic::new(rule.name(), message, rule.severity(), resolved.range)
            .with_path(resolved.path),
    )
}

fn last_key(path: &[PathSegment]) -> String {
    path.last().map(ToString::to_string).unwrap_or_default()
}

fn target_range(matched: &Match<'_>) -> Range {
    match matched.target {
        Target::Node(node) => document::report_range(node, matched.key),
        Target::Key(key) => document::key_range(key),
    }
}

fn resolve_field<'a>(matched: &Match<'a>, field: Option<&Field>) -> Resolved<'a> {
    let mut path = matched.path.clone();
    match field {
        None => {
            let value = match matched.target {
                Target::Node(node) => Value::Node(node),
                Target::Key(key) => Value::Key(key),
            };
            Resolved {
                value,
                property: last_key(&path),
                range: target_range(matched),
                path,
            }
        }
        Some(Field::Key) => {
            let value = matched.key.map_or(Value::Undefined, Value::Key);
            Resolved {
                value,
                property: last_key(&path),
                range: target_range(matched),
                path,
            }
        }
        Some(Field::Path(parts)) => {
            let Target::Node(mut node) = matched.target else {
                return Resolved {
                    value: Value::Undefined,
                    property: parts.last().cloned().unwrap_or_default(),
                    range: target_range(matched),
                    path,
                };
            };
            let mut key: Option<&MarkedScalarNode> = matched.key;
            for part in parts {
                match step(node, part) {
                    Some((segment, next_key, next)) => {
                        path.push(segment);
                        node = next;
                        key = next_key.or(key);
                    }
                    None => {
                        path.push(PathSegment::key(part.as_str()));
                        return Resolved {
                            value: Value::Undefined,
                            property: part.clone(),
                            range: document::report_range(node, key),
                            path,
                        };
                    }
                }
            }
            Resolved {
                value: Value::Node(node),
                property: parts.last().cloned().unwrap_or_default(),
                range: document::report_range(node, key),
                path,
            }
        }
    }
}

fn step<'a>(
    node: &'a Node,
    part: &str,
) -> Option<(PathSegment, Option<&'a MarkedScalarNode>, &'a Node)> {
    if let Some((key, value)) = document::child(node, part) {
        return Some((PathSegment::key(part), Some(key), value));
    }
    let index: usize = part.parse().ok()?;
    document::item(node, index).map(|value| (PathSegment::Index(index), None, value))
}

fn render_message(rule: &Rule, error: &str, resolved: &Resolved<'_>) -> String {
    let Some(template) = rule.message() else {
        return error.to_string();
    };
    template
        .replace("{{error}}", error)
        .replace("{{property}}", &resolved.property)
        .replace("{{path}}", &crate::path::join_segments(&resolved.path))
        .replace("{{description}}", rule.description().unwrap_or_default())
        .replace("{{value}}", resolved.value.as_str().unwrap_or_default())
}
