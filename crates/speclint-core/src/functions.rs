//! Built-in rule functions.
//!
//! A function receives the value selected by a rule's `given` and `field`
//! and returns an error message when the value violates the assertion.

use marked_yaml::types::MarkedScalarNode;
use marked_yaml::Node;
use regex::Regex;
use std::fmt;

use crate::document;

/// The value a function is applied to.
#[derive(Debug, Clone, Copy)]
pub enum Value<'a> {
    /// The field does not exist.
    Undefined,
    /// A document node.
    Node(&'a Node),
    /// A mapping key.
    Key(&'a MarkedScalarNode),
}

impl<'a> Value<'a> {
    /// Returns the text of a scalar or key value.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Undefined => None,
            Self::Node(node) => document::scalar_str(node),
            Self::Key(key) => Some(key.as_str()),
        }
    }

    /// Returns true for any defined value that is not a falsy scalar.
    ///
    /// Mappings and sequences are always truthy, even when empty.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined => false,
            Self::Node(Node::Scalar(s)) => !document::is_falsy_scalar(s.as_str()),
            Self::Key(key) => !document::is_falsy_scalar(key.as_str()),
            Self::Node(_) => true,
        }
    }

    fn length(&self) -> Option<usize> {
        match self {
            Self::Undefined => None,
            Self::Node(Node::Scalar(s)) => Some(s.as_str().chars().count()),
            Self::Node(node) => document::len(node),
            Self::Key(key) => Some(key.as_str().chars().count()),
        }
    }
}

/// Identifier casing styles understood by the `casing` function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasingKind {
    /// `flatcase`
    Flat,
    /// `camelCase`
    Camel,
    /// `PascalCase`
    Pascal,
    /// `kebab-case`
    Kebab,
    /// `COBOL-CASE`
    Cobol,
    /// `snake_case`
    Snake,
    /// `MACRO_CASE`
    Macro,
}

impl CasingKind {
    /// Parses a casing name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "flat" => Some(Self::Flat),
            "camel" => Some(Self::Camel),
            "pascal" => Some(Self::Pascal),
            "kebab" => Some(Self::Kebab),
            "cobol" => Some(Self::Cobol),
            "snake" => Some(Self::Snake),
            "macro" => Some(Self::Macro),
            _ => None,
        }
    }

    /// Returns the anchored regex matching this casing.
    #[must_use]
    pub fn pattern(self) -> &'static str {
        match self {
            Self::Flat => "^[a-z][a-z0-9]*$",
            Self::Camel => "^[a-z][a-z0-9]*(?:[A-Z0-9][a-z0-9]*)*$",
            Self::Pascal => "^[A-Z][a-z0-9]*(?:[A-Z0-9][a-z0-9]*)*$",
            Self::Kebab => "^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$",
            Self::Cobol => "^[A-Z][A-Z0-9]*(?:-[A-Z0-9]+)*$",
            Self::Snake => "^[a-z][a-z0-9]*(?:_[a-z0-9]+)*$",
            Self::Macro => "^[A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*$",
        }
    }
}

impl fmt::Display for CasingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Flat => "flat",
            Self::Camel => "camel",
            Self::Pascal => "pascal",
            Self::Kebab => "kebab",
            Self::Cobol => "cobol",
            Self::Snake => "snake",
            Self::Macro => "macro",
        };
        f.write_str(name)
    }
}

/// A validated rule function with its options.
#[derive(Debug, Clone)]
pub enum RuleFunction {
    /// Value must be defined and not falsy.
    Truthy,
    /// Value must be undefined or falsy.
    Falsy,
    /// Value must be defined.
    Defined,
    /// Value must be undefined.
    Undefined,
    /// String value must (not) match regular expressions.
    Pattern {
        /// Regex the value must match.
        matches: Option<Regex>,
        /// Regex the value must not match.
        not_matches: Option<Regex>,
    },
    /// Scalar value must be one of a fixed set.
    Enumeration {
        /// Allowed values.
        values: Vec<String>,
    },
    /// Length of a string, sequence or mapping must be within bounds.
    Length {
        /// Inclusive minimum.
        min: Option<usize>,
        /// Inclusive maximum.
        max: Option<usize>,
    },
    /// String value must follow an identifier casing.
    Casing {
        /// Expected casing.
        kind: CasingKind,
        /// Compiled [`CasingKind::pattern`].
        regex: Regex,
    },
    /// Sequence items (or mapping keys) must be sorted.
    Alphabetical {
        /// Compare sequence items by this key instead of their own value.
        keyed_by: Option<String>,
    },
}

impl RuleFunction {
    /// Returns the function name as written in rulesets.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Truthy => "truthy",
            Self::Falsy => "falsy",
            Self::Defined => "defined",
            Self::Undefined => "undefined",
            Self::Pattern { .. } => "pattern",
            Self::Enumeration { .. } => "enumeration",
            Self::Length { .. } => "length",
            Self::Casing { .. } => "casing",
            Self::Alphabetical { .. } => "alphabetical",
        }
    }

    /// Applies the function, returning an error message on violation.
    ///
    /// `property` names the checked field in messages.
    #[must_use]
    pub fn evaluate(&self, value: Value<'_>, property: &str) -> Option<String> {
        let property = if property.is_empty() {
            "Document".to_string()
        } else {
            format!("`{property}`")
        };

        match self {
            Self::Truthy => (!value.is_truthy())
                .then(|| format!("{property} property must be truthy")),
            Self::Falsy => value
                .is_truthy()
                .then(|| format!("{property} property must be falsy")),
            Self::Defined => matches!(value, Value::Undefined)
                .then(|| format!("{property} property must be defined")),
            Self::Undefined => (!matches!(value, Value::Undefined))
                .then(|| format!("{property} property must be undefined")),
            Self::Pattern {
                matches,
                not_matches,
            } => {
                let text = value.as_str()?;
                if let Some(re) = matches {
                    if !re.is_match(text) {
                        return Some(format!(
                            "{property} must match the pattern \"{}\"",
                            re.as_str()
                        ));
                    }
                }
                if let Some(re) = not_matches {
                    if re.is_match(text) {
                        return Some(format!(
                            "{property} must not match the pattern \"{}\"",
                            re.as_str()
                        ));
                    }
                }
                None
            }
            Self::Enumeration { values } => {
                let text = value.as_str()?;
                (!values.iter().any(|v| v == text)).then(|| {
                    let allowed = values
                        .iter()
                        .map(|v| format!("\"{v}\""))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("\"{text}\" must be equal to one of the allowed values: {allowed}")
                })
            }
            Self::Length { min, max } => {
                let length = value.length()?;
                if let Some(min) = min {
                    if length < *min {
                        return Some(format!("{property} must not be shorter than {min}"));
                    }
                }
                if let Some(max) = max {
                    if length > *max {
                        return Some(format!("{property} must not be longer than {max}"));
                    }
                }
                None
            }
            Self::Casing { kind, regex } => {
                let text = value.as_str()?;
                (!regex.is_match(text)).then(|| format!("{property} must be {kind} case"))
            }
            Self::Alphabetical { keyed_by } => {
                let Value::Node(node) = value else {
                    return None;
                };
                let items = sort_keys(node, keyed_by.as_deref());
                let unsorted = items.windows(2).any(|pair| pair[0] > pair[1]);
                unsorted.then(|| format!("{property} must be sorted alphabetically"))
            }
        }
    }
}

fn sort_keys<'a>(node: &'a Node, keyed_by: Option<&str>) -> Vec<&'a str> {
    match node {
        Node::Sequence(_) => document::children(node)
            .into_iter()
            .filter_map(|(_, _, item)| match keyed_by {
                Some(key) => document::child(item, key).and_then(|(_, v)| document::scalar_str(v)),
                None => document::scalar_str(item),
            })
            .collect(),
        Node::Mapping(_) => document::children(node)
            .into_iter()
            .filter_map(|(_, key, _)| key.map(MarkedScalarNode::as_str))
            .collect(),
        Node::Scalar(_) => Vec::new(),
    }
}
