//! A JSONPath subset for selecting document nodes.
//!
//! Supported syntax:
//!
//! - `$` the document root
//! - `.name`, `['name']`, `["name"]` a mapping key
//! - `[0]` a sequence index
//! - `.*`, `[*]` every child
//! - `[get,put]` a union of mapping keys
//! - `..name`, `..*` recursive descent
//! - a trailing `~` selects the keys of the matched nodes
//!
//! Filter expressions (`[?(...)]`) are rejected at parse time.

use marked_yaml::types::MarkedScalarNode;
use marked_yaml::Node;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document;

/// One step in a concrete document path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Index into a sequence.
    Index(usize),
    /// Key of a mapping.
    Key(String),
}

impl PathSegment {
    /// Creates a key segment.
    #[must_use]
    pub fn key(name: impl Into<String>) -> Self {
        Self::Key(name.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => write!(f, "{k}"),
        }
    }
}

/// Joins path segments with `.` (e.g., `paths./pets.get`).
#[must_use]
pub fn join_segments(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// Errors from parsing a path expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The expression does not start with `$`.
    #[error("`{expression}`: path must start with `$`")]
    MissingRoot {
        /// The offending expression.
        expression: String,
    },

    /// Filter expressions are not supported.
    #[error("`{expression}`: filter expressions are not supported")]
    UnsupportedFilter {
        /// The offending expression.
        expression: String,
    },

    /// Any other syntax problem.
    #[error("`{expression}`: {reason}")]
    Syntax {
        /// The offending expression.
        expression: String,
        /// What went wrong.
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Key(String),
    Index(usize),
    Wildcard,
    Union(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Child(Selector),
    Descendant(Selector),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    raw: String,
    steps: Vec<Step>,
    keys: bool,
}

/// What a path match points at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A value node.
    Node(&'a Node),
    /// A mapping key (selected with `~`).
    Key(&'a MarkedScalarNode),
}

/// A node selected by a [`JsonPath`].
#[derive(Debug, Clone)]
pub struct Match<'a> {
    /// Concrete path from the root to the match.
    pub path: Vec<PathSegment>,
    /// The selected node or key.
    pub target: Target<'a>,
    /// The mapping key under which the node sits, if any.
    pub key: Option<&'a MarkedScalarNode>,
}

impl JsonPath {
    /// Parses a path expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression is malformed or uses unsupported syntax.
    pub fn parse(expression: &str) -> Result<Self, PathError> {
        let syntax = |reason: &str| PathError::Syntax {
            expression: expression.to_string(),
            reason: reason.to_string(),
        };

        let rest = expression
            .trim()
            .strip_prefix('$')
            .ok_or_else(|| PathError::MissingRoot {
                expression: expression.to_string(),
            })?;

        let (rest, keys) = match rest.strip_suffix('~') {
            Some(r) => (r, true),
            None => (rest, false),
        };

        let chars: Vec<char> = rest.chars().collect();
        let mut steps = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '.' => {
                    let descendant = chars.get(i + 1) == Some(&'.');
                    i += if descendant { 2 } else { 1 };
                    let selector = if chars.get(i) == Some(&'[') {
                        let (selector, next) = parse_bracket(&chars, i, expression)?;
                        i = next;
                        selector
                    } else {
                        let start = i;
                        while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                            i += 1;
                        }
                        let name: String = chars[start..i].iter().collect();
                        match name.as_str() {
                            "" => return Err(syntax("empty segment")),
                            "*" => Selector::Wildcard,
                            _ => Selector::Key(name),
                        }
                    };
                    steps.push(if descendant {
                        Step::Descendant(selector)
                    } else {
                        Step::Child(selector)
                    });
                }
                '[' => {
                    let (selector, next) = parse_bracket(&chars, i, expression)?;
                    i = next;
                    steps.push(Step::Child(selector));
                }
                '~' => return Err(syntax("`~` is only allowed at the end")),
                _ => return Err(syntax("expected `.` or `[`")),
            }
        }

        Ok(Self {
            raw: expression.to_string(),
            steps,
            keys,
        })
    }

    /// Returns the expression as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Evaluates the path against a document root.
    #[must_use]
    pub fn evaluate<'a>(&self, root: &'a Node) -> Vec<Match<'a>> {
        let mut current = vec![Match {
            path: Vec::new(),
            target: Target::Node(root),
            key: None,
        }];

        for step in &self.steps {
            let mut next = Vec::new();
            for entry in &current {
                let Target::Node(node) = entry.target else {
                    continue;
                };
                match step {
                    Step::Child(selector) => select(node, &entry.path, selector, &mut next),
                    Step::Descendant(selector) => {
                        let mut stack = vec![(entry.path.clone(), node)];
                        while let Some((path, node)) = stack.pop() {
                            select(node, &path, selector, &mut next);
                            let mut children = document::children(node);
                            children.reverse();
                            for (segment, _, child) in children {
                                let mut child_path = path.clone();
                                child_path.push(segment);
                                stack.push((child_path, child));
                            }
                        }
                    }
                }
            }
            current = next;
        }

        if self.keys {
            current
                .into_iter()
                .filter_map(|m| {
                    m.key.map(|key| Match {
                        path: m.path,
                        target: Target::Key(key),
                        key: Some(key),
                    })
                })
                .collect()
        } else {
            current
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn select<'a>(
    node: &'a Node,
    path: &[PathSegment],
    selector: &Selector,
    out: &mut Vec<Match<'a>>,
) {
    let mut push = |segment: PathSegment, key: Option<&'a MarkedScalarNode>, child: &'a Node| {
        let mut child_path = path.to_vec();
        child_path.push(segment);
        out.push(Match {
            path: child_path,
            target: Target::Node(child),
            key,
        });
    };

    match selector {
        Selector::Wildcard => {
            for (segment, key, child) in document::children(node) {
                push(segment, key, child);
            }
        }
        Selector::Key(name) => {
            if let Some((key, child)) = document::child(node, name) {
                push(PathSegment::Key(name.clone()), Some(key), child);
            }
        }
        Selector::Union(names) => {
            for name in names {
                if let Some((key, child)) = document::child(node, name) {
                    push(PathSegment::Key(name.clone()), Some(key), child);
                }
            }
        }
        Selector::Index(index) => {
            if let Some(child) = document::item(node, *index) {
                push(PathSegment::Index(*index), None, child);
            }
        }
    }
}

/// Parses a `[...]` selector starting at `chars[start] == '['`.
///
/// Returns the selector and the index just past the closing bracket.
fn parse_bracket(
    chars: &[char],
    start: usize,
    expression: &str,
) -> Result<(Selector, usize), PathError> {
    let syntax = |reason: &str| PathError::Syntax {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let mut i = start + 1;
    if chars.get(i) == Some(&'?') {
        return Err(PathError::UnsupportedFilter {
            expression: expression.to_string(),
        });
    }

    let mut items: Vec<String> = Vec::new();
    let mut quoted_any = false;
    loop {
        while chars.get(i) == Some(&' ') {
            i += 1;
        }
        let item = match chars.get(i) {
            Some(&quote) if quote == '\'' || quote == '"' => {
                quoted_any = true;
                let begin = i + 1;
                let end = chars[begin..]
                    .iter()
                    .position(|&c| c == quote)
                    .map(|p| begin + p)
                    .ok_or_else(|| syntax("unterminated quoted key"))?;
                i = end + 1;
                chars[begin..end].iter().collect()
            }
            Some(_) => {
                let begin = i;
                while i < chars.len() && chars[i] != ',' && chars[i] != ']' {
                    i += 1;
                }
                chars[begin..i].iter().collect::<String>().trim().to_string()
            }
            None => return Err(syntax("unterminated `[`")),
        };
        items.push(item);
        while chars.get(i) == Some(&' ') {
            i += 1;
        }
        match chars.get(i) {
            Some(',') => i += 1,
            Some(']') => {
                i += 1;
                break;
            }
            _ => return Err(syntax("expected `,` or `]`")),
        }
    }

    let selector = match items.as_slice() {
        [single] if single.is_empty() => return Err(syntax("empty brackets")),
        [single] if single == "*" && !quoted_any => Selector::Wildcard,
        [single] if !quoted_any && single.chars().all(|c| c.is_ascii_digit()) => Selector::Index(
            single
                .parse()
                .map_err(|_| syntax("index out of range"))?,
        ),
        [single] => Selector::Key(single.clone()),
        many => Selector::Union(many.to_vec()),
    };

    Ok((selector, i))
}
