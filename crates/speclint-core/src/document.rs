//! Parsed API description documents with source positions.
//!
//! Documents are parsed with `marked-yaml`, which keeps a span for every
//! node. JSON documents parse through the same path since JSON is valid
//! YAML flow syntax.

use marked_yaml::types::{MarkedMappingNode, MarkedScalarNode, Marker, Span};
use marked_yaml::{LoadError, LoaderOptions, Node};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::PathSegment;
use crate::types::{Position, Range};

/// Errors from parsing a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The document is not well-formed YAML/JSON.
    #[error("syntax error: {0}")]
    Syntax(String),
}

/// Document dialects that rules can be scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    /// Swagger / OpenAPI 2.0.
    #[serde(rename = "oas2")]
    Oas2,
    /// Any OpenAPI 3.x version.
    #[serde(rename = "oas3")]
    Oas3,
    /// OpenAPI 3.0.x.
    #[serde(rename = "oas3.0")]
    Oas3_0,
    /// OpenAPI 3.1.x.
    #[serde(rename = "oas3.1")]
    Oas3_1,
}

impl Format {
    /// Parses a format name as written in rulesets.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "oas2" => Some(Self::Oas2),
            "oas3" => Some(Self::Oas3),
            "oas3.0" | "oas3_0" => Some(Self::Oas3_0),
            "oas3.1" | "oas3_1" => Some(Self::Oas3_1),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oas2 => write!(f, "oas2"),
            Self::Oas3 => write!(f, "oas3"),
            Self::Oas3_0 => write!(f, "oas3.0"),
            Self::Oas3_1 => write!(f, "oas3.1"),
        }
    }
}

/// A parsed document.
#[derive(Debug)]
pub struct Document {
    root: Node,
    formats: Vec<Format>,
}

impl Document {
    /// Parses YAML or JSON source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not well-formed.
    ///
    /// Any top-level node is accepted. A sequence root is kept as is; a
    /// scalar root becomes an empty mapping, so no format is detected.
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        let root = parse_root(source).map_err(|e| DocumentError::Syntax(e.to_string()))?;
        let formats = detect_formats(&root);
        Ok(Self { root, formats })
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Returns the formats this document was detected as.
    #[must_use]
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }
}

fn parse_root(source: &str) -> Result<Node, LoadError> {
    match marked_yaml::parse_yaml(0, source) {
        Err(LoadError::TopLevelMustBeMapping(_)) => {
            match marked_yaml::parse_yaml_with_options(
                0,
                source,
                LoaderOptions::default().toplevel_sequence(),
            ) {
                Err(
                    LoadError::TopLevelMustBeMapping(_) | LoadError::TopLevelMustBeSequence(_),
                ) => Ok(MarkedMappingNode::new_empty(Span::new_blank()).into()),
                other => other,
            }
        }
        other => other,
    }
}

fn detect_formats(root: &Node) -> Vec<Format> {
    if let Some(version) = child_str(root, "swagger") {
        if version.starts_with("2.") || version == "2" {
            return vec![Format::Oas2];
        }
    }
    if let Some(version) = child_str(root, "openapi") {
        if version.starts_with("3.0") {
            return vec![Format::Oas3, Format::Oas3_0];
        }
        if version.starts_with("3.1") {
            return vec![Format::Oas3, Format::Oas3_1];
        }
        if version.starts_with("3.") {
            return vec![Format::Oas3];
        }
    }
    Vec::new()
}

fn child_str<'a>(node: &'a Node, name: &str) -> Option<&'a str> {
    match child(node, name)? {
        (_, Node::Scalar(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Returns every child of a mapping or sequence, in document order.
#[must_use]
pub fn children(node: &Node) -> Vec<(PathSegment, Option<&MarkedScalarNode>, &Node)> {
    match node {
        Node::Mapping(map) => map
            .iter()
            .map(|(k, v)| (PathSegment::Key(k.as_str().to_string()), Some(k), v))
            .collect(),
        Node::Sequence(seq) => seq
            .iter()
            .enumerate()
            .map(|(i, v)| (PathSegment::Index(i), None, v))
            .collect(),
        Node::Scalar(_) => Vec::new(),
    }
}

/// Looks up a mapping entry, returning its key node and value.
#[must_use]
pub fn child<'a>(node: &'a Node, name: &str) -> Option<(&'a MarkedScalarNode, &'a Node)> {
    match node {
        Node::Mapping(map) => map.iter().find(|(k, _)| k.as_str() == name),
        _ => None,
    }
}

/// Looks up a sequence item.
#[must_use]
pub fn item(node: &Node, index: usize) -> Option<&Node> {
    match node {
        Node::Sequence(seq) => seq.get(index),
        _ => None,
    }
}

/// Returns the text of a scalar node.
#[must_use]
pub fn scalar_str(node: &Node) -> Option<&str> {
    match node {
        Node::Scalar(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Returns true if a scalar spells a falsy value (`false`, `0`, `null`, `~`, or empty).
#[must_use]
pub fn is_falsy_scalar(value: &str) -> bool {
    matches!(value, "" | "false" | "False" | "FALSE" | "0" | "null" | "Null" | "NULL" | "~")
}

/// Returns the number of entries in a mapping or sequence.
#[must_use]
pub fn len(node: &Node) -> Option<usize> {
    match node {
        Node::Mapping(map) => Some(map.len()),
        Node::Sequence(seq) => Some(seq.len()),
        Node::Scalar(_) => None,
    }
}

fn position(marker: &Marker) -> Position {
    Position::new(
        marker.line().saturating_sub(1),
        marker.column().saturating_sub(1),
    )
}

fn span_range(span: &Span, fallback_len: usize) -> Range {
    let Some(start) = span.start().map(position) else {
        return Range::default();
    };
    let end = span
        .end()
        .map(position)
        .filter(|end| *end > start)
        .unwrap_or_else(|| Position::new(start.line, start.character + fallback_len));
    Range::new(start, end)
}

/// Returns the source range of a key node.
#[must_use]
pub fn key_range(key: &MarkedScalarNode) -> Range {
    span_range(key.span(), key.as_str().chars().count())
}

/// Returns the source range of a value node.
#[must_use]
pub fn node_range(node: &Node) -> Range {
    match node {
        Node::Scalar(s) => span_range(s.span(), s.as_str().chars().count()),
        Node::Mapping(m) => span_range(m.span(), 0),
        Node::Sequence(s) => span_range(s.span(), 0),
    }
}

/// Returns the range used to report a node.
///
/// Scalars report their own span. Mappings and sequences report the key
/// they sit under so the range stays on one line.
#[must_use]
pub fn report_range(node: &Node, key: Option<&MarkedScalarNode>) -> Range {
    match (node, key) {
        (Node::Scalar(_), _) | (_, None) => node_range(node),
        (_, Some(key)) => key_range(key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_openapi_versions() {
        let doc = Document::parse("openapi: 3.1.0\ninfo: {}\n").unwrap();
        assert_eq!(doc.formats(), &[Format::Oas3, Format::Oas3_1]);

        let doc = Document::parse("swagger: \"2.0\"\n").unwrap();
        assert_eq!(doc.formats(), &[Format::Oas2]);

        let doc = Document::parse("asyncapi: 2.0.0\n").unwrap();
        assert!(doc.formats().is_empty());
    }

    #[test]
    fn parses_json_documents() {
        let doc = Document::parse(r#"{"openapi": "3.0.3", "info": {"title": "x"}}"#).unwrap();
        assert_eq!(doc.formats(), &[Format::Oas3, Format::Oas3_0]);
        assert!(child(doc.root(), "info").is_some());
    }

    #[test]
    fn accepts_non_mapping_roots() {
        let doc = Document::parse("- a\n- b\n").unwrap();
        assert!(doc.formats().is_empty());
        assert_eq!(len(doc.root()), Some(2));

        let doc = Document::parse("just a string\n").unwrap();
        assert!(doc.formats().is_empty());
        assert_eq!(len(doc.root()), Some(0));
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = Document::parse("info: [unclosed\n").unwrap_err();
        assert!(matches!(err, DocumentError::Syntax(_)));
    }

    #[test]
    fn ranges_are_zero_indexed() {
        let doc = Document::parse("openapi: 3.0.0\ninfo:\n  title: Pets\n").unwrap();
        let (key, info) = child(doc.root(), "info").unwrap();
        assert_eq!(key_range(key).start, Position::new(1, 0));

        let (_, title) = child(info, "title").unwrap();
        let range = node_range(title);
        assert_eq!(range.start, Position::new(2, 9));
        assert!(range.is_single_line());

        assert_eq!(report_range(info, Some(key)), key_range(key));
    }

    #[test]
    fn falsy_scalars() {
        assert!(is_falsy_scalar("false"));
        assert!(is_falsy_scalar(""));
        assert!(is_falsy_scalar("~"));
        assert!(!is_falsy_scalar("no-op"));
    }
}
