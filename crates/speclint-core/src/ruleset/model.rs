//! Pure domain model for rulesets.
//!
//! This module contains no serde and no I/O. All invariants are enforced
//! at construction time by the loader.

use crate::document::Format;
use crate::functions::RuleFunction;
use crate::path::JsonPath;
use crate::types::Severity;

/// Which field of a given node an assertion applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The mapping key the node sits under (`@key`).
    Key,
    /// A nested field, split on `.` (e.g., `contact.email`).
    Path(Vec<String>),
}

impl Field {
    /// Parses a `field` value from a ruleset.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "@key" {
            Self::Key
        } else {
            Self::Path(value.split('.').map(String::from).collect())
        }
    }
}

/// One assertion of a rule.
#[derive(Debug, Clone)]
pub struct Then {
    /// Field to check; `None` checks the given node itself.
    pub field: Option<Field>,
    /// Function applied to the field value.
    pub function: RuleFunction,
}

/// A validated rule.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    description: Option<String>,
    message: Option<String>,
    severity: Severity,
    enabled: bool,
    recommended: bool,
    given: Vec<JsonPath>,
    then: Vec<Then>,
    formats: Vec<Format>,
}

impl Rule {
    /// Creates a new enabled rule.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        severity: Severity,
        given: Vec<JsonPath>,
        then: Vec<Then>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            message: None,
            severity,
            enabled: true,
            recommended: true,
            given,
            then,
            formats: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Sets the message template.
    #[must_use]
    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    /// Sets whether the rule belongs to the recommended set.
    #[must_use]
    pub fn with_recommended(mut self, recommended: bool) -> Self {
        self.recommended = recommended;
        self
    }

    /// Restricts the rule to the given formats (empty means all).
    #[must_use]
    pub fn with_formats(mut self, formats: Vec<Format>) -> Self {
        self.formats = formats;
        self
    }

    /// Returns the rule name, used as the diagnostic code.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the message template.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the severity diagnostics are reported with.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns true if the rule runs.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns true if the rule is part of the recommended set.
    #[must_use]
    pub fn is_recommended(&self) -> bool {
        self.recommended
    }

    /// Returns the given expressions.
    #[must_use]
    pub fn given(&self) -> &[JsonPath] {
        &self.given
    }

    /// Returns the assertions.
    #[must_use]
    pub fn then(&self) -> &[Then] {
        &self.then
    }

    /// Returns the formats this rule is restricted to.
    #[must_use]
    pub fn formats(&self) -> &[Format] {
        &self.formats
    }

    /// Returns true if the rule should run against a document with `formats`.
    #[must_use]
    pub fn applies_to(&self, formats: &[Format]) -> bool {
        self.formats.is_empty() || self.formats.iter().any(|f| formats.contains(f))
    }

    pub(crate) fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// An ordered collection of uniquely named rules.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: Vec<Rule>,
}

impl Ruleset {
    /// Creates an empty ruleset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rule, replacing any existing rule with the same name in place.
    pub fn insert(&mut self, rule: Rule) {
        if let Some(existing) = self.rules.iter_mut().find(|r| r.name == rule.name) {
            *existing = rule;
        } else {
            self.rules.push(rule);
        }
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.name == name)
    }

    /// Returns all rules, enabled or not.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterates over the rules that run.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.enabled)
    }

    /// Returns the number of rules that run.
    #[must_use]
    pub fn enabled_count(&self) -> usize {
        self.enabled_rules().count()
    }

    /// Returns true if the ruleset has no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
