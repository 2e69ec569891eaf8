//! Ruleset deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization of YAML/JSON
//! rulesets. They are converted to domain model types via the loader.

use serde::Deserialize;
use std::collections::BTreeMap;

/// Raw representation of a ruleset file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesetDto {
    /// Rulesets this one inherits from.
    #[serde(default)]
    pub extends: Option<ExtendsDto>,

    /// Formats applied to local rules that declare none.
    #[serde(default)]
    pub formats: Vec<String>,

    /// Rule definitions and severity overrides, keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleEntryDto>,

    /// Custom function modules (legacy, rejected).
    #[serde(default)]
    pub functions: Vec<String>,

    /// Custom function directory (legacy, rejected).
    #[serde(default)]
    pub functions_dir: Option<String>,
}

/// `extends` accepts one entry or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExtendsDto {
    /// A single ruleset reference.
    One(ExtendsEntryDto),
    /// Several ruleset references, applied in order.
    Many(Vec<ExtendsEntryDto>),
}

impl ExtendsDto {
    /// Flattens into a list of entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<ExtendsEntryDto> {
        match self {
            Self::One(entry) => vec![entry],
            Self::Many(entries) => entries,
        }
    }
}

/// One `extends` entry: a reference, optionally paired with a mode.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ExtendsEntryDto {
    /// `speclint:oas`, `./base.yaml`, `https://...`
    Name(String),
    /// `[speclint:oas, all]`
    WithMode(String, String),
}

impl ExtendsEntryDto {
    /// Returns the referenced ruleset.
    #[must_use]
    pub fn reference(&self) -> &str {
        match self {
            Self::Name(name) | Self::WithMode(name, _) => name,
        }
    }

    /// Returns the mode, if one was given.
    #[must_use]
    pub fn mode(&self) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::WithMode(_, mode) => Some(mode),
        }
    }
}

/// A value in the `rules` map: a severity override or a full definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleEntryDto {
    /// Changes the severity of an inherited rule.
    Severity(SeverityDto),
    /// Defines (or replaces) a rule.
    Definition(Box<RuleDto>),
}

/// Severity spelled as a name, a numeric code, or a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeverityDto {
    /// `true` enables with the default severity, `false` disables.
    Flag(bool),
    /// `0` = error .. `3` = hint, `-1` = off.
    Code(i64),
    /// `error`, `warn`, `info`, `hint`, `off`.
    Name(String),
}

/// A full rule definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDto {
    /// What the rule checks.
    #[serde(default)]
    pub description: Option<String>,

    /// Legacy spelling of `description`.
    #[serde(default)]
    pub summary: Option<String>,

    /// Message template.
    #[serde(default)]
    pub message: Option<String>,

    /// Severity (default: warn).
    #[serde(default)]
    pub severity: Option<SeverityDto>,

    /// Whether the rule is part of the recommended set (default: true).
    #[serde(default)]
    pub recommended: Option<bool>,

    /// Path expressions selecting the nodes to check.
    pub given: OneOrMany<String>,

    /// Assertions applied to each selected node.
    pub then: OneOrMany<ThenDto>,

    /// Formats this rule applies to.
    #[serde(default)]
    pub formats: Vec<String>,
}

/// One assertion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThenDto {
    /// Field of the given node to check (`@key` for the key itself).
    #[serde(default)]
    pub field: Option<String>,

    /// Function name.
    pub function: String,

    /// Function options.
    #[serde(default)]
    pub function_options: Option<serde_yaml::Value>,
}

/// A value that may be written as a single item or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item.
    One(T),
    /// A list of items.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Flattens into a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }
}

/// Parses ruleset text. YAML and JSON are both accepted.
///
/// # Errors
///
/// Returns an error if the text is not a valid ruleset document.
pub fn parse(content: &str) -> Result<RulesetDto, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(RulesetDto::default());
    }
    serde_yaml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto = parse("").unwrap();
        assert!(dto.extends.is_none());
        assert!(dto.rules.is_empty());
    }

    #[test]
    fn deserialize_full_ruleset() {
        let dto = parse(
            r#"
extends: [["speclint:oas", all], ./shared.yaml]
formats: [oas3]
rules:
  info-contact: off
  operation-tags: 1
  no-x-internal: false
  paths-kebab-case:
    description: Paths must be kebab-case.
    severity: error
    given: $.paths.*~
    then:
      function: pattern
      functionOptions:
        match: "^(/[a-z0-9-{}]+)+$"
"#,
        )
        .unwrap();

        let extends = dto.extends.unwrap().into_entries();
        assert_eq!(
            extends,
            vec![
                ExtendsEntryDto::WithMode("speclint:oas".into(), "all".into()),
                ExtendsEntryDto::Name("./shared.yaml".into()),
            ]
        );
        assert_eq!(dto.formats, vec!["oas3"]);
        assert!(matches!(
            dto.rules["info-contact"],
            RuleEntryDto::Severity(SeverityDto::Name(ref s)) if s == "off"
        ));
        assert!(matches!(
            dto.rules["operation-tags"],
            RuleEntryDto::Severity(SeverityDto::Code(1))
        ));
        assert!(matches!(
            dto.rules["no-x-internal"],
            RuleEntryDto::Severity(SeverityDto::Flag(false))
        ));
        let RuleEntryDto::Definition(rule) = &dto.rules["paths-kebab-case"] else {
            panic!("expected a definition");
        };
        assert_eq!(rule.then.clone().into_vec()[0].function, "pattern");
    }

    #[test]
    fn deserialize_json_ruleset() {
        let dto =
            parse(r#"{"extends": "spectral:oas", "rules": {"info-contact": "warn"}}"#).unwrap();
        assert_eq!(
            dto.extends.unwrap().into_entries(),
            vec![ExtendsEntryDto::Name("spectral:oas".into())]
        );
        assert_eq!(dto.rules.len(), 1);
    }

    #[test]
    fn deserialize_legacy_function_fields() {
        let dto = parse("functionsDir: ./functions\nfunctions: [checkIds]\n").unwrap();
        assert_eq!(dto.functions_dir.as_deref(), Some("./functions"));
        assert_eq!(dto.functions, vec!["checkIds"]);
    }
}
