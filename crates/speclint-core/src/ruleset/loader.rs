//! DTO → Domain model conversion with validation.

use regex::Regex;
use serde_yaml::Value as Yaml;

use crate::document::Format;
use crate::functions::{CasingKind, RuleFunction};
use crate::path::{JsonPath, PathError};
use crate::types::Severity;

use super::dto::{RuleDto, RuleEntryDto, RulesetDto, SeverityDto, ThenDto};
use super::model::{Field, Rule, Ruleset, Then};

/// Errors during DTO → Domain conversion.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Unknown severity value.
    #[error("{context}: unknown severity `{value}`, expected: error, warn, info, hint, off")]
    UnknownSeverity {
        /// Where the error occurred (e.g., "rules.info-contact.severity").
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A `given` expression did not parse.
    #[error("{context}: {source}")]
    InvalidPath {
        /// Where the error occurred.
        context: String,
        /// The underlying path error.
        source: PathError,
    },

    /// A `then.function` names no known function.
    #[error("{context}: unknown function `{name}`")]
    UnknownFunction {
        /// Where the error occurred.
        context: String,
        /// The function name.
        name: String,
    },

    /// Function options are missing or malformed.
    #[error("{context}: invalid options for `{function}`: {reason}")]
    InvalidFunctionOptions {
        /// Where the error occurred.
        context: String,
        /// The function name.
        function: String,
        /// What is wrong.
        reason: String,
    },

    /// A `formats` entry names no known format.
    #[error("{context}: unknown format `{value}`, expected: oas2, oas3, oas3.0, oas3.1")]
    UnknownFormat {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// A regular expression failed to compile.
    #[error("{context}: invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// Where the error occurred.
        context: String,
        /// The pattern as written.
        pattern: String,
        /// The regex error.
        source: regex::Error,
    },

    /// Custom JavaScript functions are not supported.
    #[error("custom functions are not supported (declared: {})", format_names(.names))]
    CustomFunctions {
        /// Declared function names.
        names: Vec<String>,
    },

    /// A severity override targets a rule that no extended ruleset defines.
    #[error("rules.{name}: cannot override severity of unknown rule `{name}`")]
    UnknownRule {
        /// The rule name.
        name: String,
    },
}

fn format_names(names: &[String]) -> String {
    if names.is_empty() {
        "functionsDir".to_string()
    } else {
        names.join(", ")
    }
}

/// How an extended ruleset contributes its rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtendsMode {
    /// Only rules marked recommended run.
    #[default]
    Recommended,
    /// Every rule runs.
    All,
    /// Rules are inherited but disabled.
    Off,
}

impl ExtendsMode {
    /// Parses a mode as written in an `extends` entry.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recommended" => Some(Self::Recommended),
            "all" => Some(Self::All),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Converts a `RulesetDto` to a validated `Ruleset`, layered over its parents.
///
/// Parents are applied in order, then local definitions and severity
/// overrides.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: RulesetDto, parents: Vec<(Ruleset, ExtendsMode)>) -> Result<Ruleset, LoadError> {
    let mut ruleset = Ruleset::new();
    for (parent, mode) in parents {
        for mut rule in parent.rules().iter().cloned() {
            match mode {
                ExtendsMode::Recommended => {}
                ExtendsMode::All => rule.set_enabled(true),
                ExtendsMode::Off => rule.set_enabled(false),
            }
            ruleset.insert(rule);
        }
    }

    let default_formats = convert_formats(&dto.formats, "formats")?;

    for (name, entry) in dto.rules {
        match entry {
            RuleEntryDto::Definition(rule) => {
                let rule = convert_rule(&name, *rule, &default_formats)?;
                ruleset.insert(rule);
            }
            RuleEntryDto::Severity(severity) => {
                let context = format!("rules.{name}");
                let override_ = convert_severity(&severity, &context)?;
                let rule = ruleset
                    .get_mut(&name)
                    .ok_or_else(|| LoadError::UnknownRule { name: name.clone() })?;
                match override_ {
                    SeverityOverride::Off => rule.set_enabled(false),
                    SeverityOverride::On => rule.set_enabled(true),
                    SeverityOverride::Level(level) => {
                        rule.set_severity(level);
                        rule.set_enabled(true);
                    }
                }
            }
        }
    }

    Ok(ruleset)
}

enum SeverityOverride {
    Off,
    On,
    Level(Severity),
}

fn convert_severity(dto: &SeverityDto, context: &str) -> Result<SeverityOverride, LoadError> {
    let unknown = |value: String| LoadError::UnknownSeverity {
        context: context.to_string(),
        value,
    };
    match dto {
        SeverityDto::Flag(true) => Ok(SeverityOverride::On),
        SeverityDto::Flag(false) | SeverityDto::Code(-1) => Ok(SeverityOverride::Off),
        SeverityDto::Code(code) => Severity::from_code(*code)
            .map(SeverityOverride::Level)
            .ok_or_else(|| unknown(code.to_string())),
        SeverityDto::Name(name) if name == "off" => Ok(SeverityOverride::Off),
        SeverityDto::Name(name) => Severity::parse(name)
            .map(SeverityOverride::Level)
            .ok_or_else(|| unknown(name.clone())),
    }
}

fn convert_formats(values: &[String], context: &str) -> Result<Vec<Format>, LoadError> {
    values
        .iter()
        .map(|value| {
            Format::parse(value).ok_or_else(|| LoadError::UnknownFormat {
                context: context.to_string(),
                value: value.clone(),
            })
        })
        .collect()
}

fn convert_rule(name: &str, dto: RuleDto, default_formats: &[Format]) -> Result<Rule, LoadError> {
    let ctx = format!("rules.{name}");

    let (severity, enabled) = match &dto.severity {
        None => (Severity::Warn, true),
        Some(severity) => match convert_severity(severity, &format!("{ctx}.severity"))? {
            SeverityOverride::Off => (Severity::Warn, false),
            SeverityOverride::On => (Severity::Warn, true),
            SeverityOverride::Level(level) => (level, true),
        },
    };

    let given = dto
        .given
        .into_vec()
        .iter()
        .enumerate()
        .map(|(i, expr)| {
            JsonPath::parse(expr).map_err(|e| LoadError::InvalidPath {
                context: format!("{ctx}.given[{i}]"),
                source: e,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let then = dto
        .then
        .into_vec()
        .into_iter()
        .enumerate()
        .map(|(i, then)| convert_then(then, &format!("{ctx}.then[{i}]")))
        .collect::<Result<Vec<_>, _>>()?;

    let formats = if dto.formats.is_empty() {
        default_formats.to_vec()
    } else {
        convert_formats(&dto.formats, &format!("{ctx}.formats"))?
    };

    let recommended = dto.recommended.unwrap_or(true);
    let mut rule = Rule::new(name, severity, given, then)
        .with_description(dto.description)
        .with_message(dto.message)
        .with_recommended(recommended)
        .with_formats(formats);
    rule.set_enabled(enabled && recommended);
    Ok(rule)
}

fn convert_then(dto: ThenDto, context: &str) -> Result<Then, LoadError> {
    let function = convert_function(&dto.function, dto.function_options.as_ref(), context)?;
    Ok(Then {
        field: dto.field.as_deref().map(Field::parse),
        function,
    })
}

/// Function options with the context needed to report bad values.
struct Options<'a> {
    raw: Option<&'a Yaml>,
    context: &'a str,
    function: &'a str,
}

impl<'a> Options<'a> {
    fn invalid(&self, reason: &str) -> LoadError {
        LoadError::InvalidFunctionOptions {
            context: self.context.to_string(),
            function: self.function.to_string(),
            reason: reason.to_string(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Yaml> {
        self.raw.and_then(|o| o.get(key)).filter(|v| !v.is_null())
    }

    fn string(&self, key: &str) -> Result<Option<&'a str>, LoadError> {
        match self.get(key) {
            None => Ok(None),
            Some(Yaml::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(&format!("`{key}` must be a string"))),
        }
    }

    fn count(&self, key: &str) -> Result<Option<usize>, LoadError> {
        self.get(key)
            .map(|value| {
                value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .ok_or_else(|| self.invalid(&format!("`{key}` must be a non-negative integer")))
            })
            .transpose()
    }
}

fn convert_function(
    name: &str,
    options: Option<&Yaml>,
    context: &str,
) -> Result<RuleFunction, LoadError> {
    let options = Options {
        raw: options,
        context,
        function: name,
    };

    match name {
        "truthy" => Ok(RuleFunction::Truthy),
        "falsy" => Ok(RuleFunction::Falsy),
        "defined" => Ok(RuleFunction::Defined),
        "undefined" => Ok(RuleFunction::Undefined),
        "pattern" => {
            let matches = options
                .string("match")?
                .map(|p| compile_pattern(p, context))
                .transpose()?;
            let not_matches = options
                .string("notMatch")?
                .map(|p| compile_pattern(p, context))
                .transpose()?;
            if matches.is_none() && not_matches.is_none() {
                return Err(options.invalid("one of `match` or `notMatch` is required"));
            }
            Ok(RuleFunction::Pattern {
                matches,
                not_matches,
            })
        }
        "enumeration" => {
            let Some(Yaml::Sequence(items)) = options.get("values") else {
                return Err(options.invalid("`values` must be a list"));
            };
            let values = items
                .iter()
                .map(|item| {
                    scalar_to_string(item)
                        .ok_or_else(|| options.invalid("`values` must be scalars"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RuleFunction::Enumeration { values })
        }
        "length" => {
            let min = options.count("min")?;
            let max = options.count("max")?;
            if min.is_none() && max.is_none() {
                return Err(options.invalid("one of `min` or `max` is required"));
            }
            Ok(RuleFunction::Length { min, max })
        }
        "casing" => {
            let kind_name = options
                .string("type")?
                .ok_or_else(|| options.invalid("`type` is required"))?;
            let kind = CasingKind::parse(kind_name)
                .ok_or_else(|| options.invalid(&format!("unknown casing type `{kind_name}`")))?;
            let regex = Regex::new(kind.pattern()).map_err(|e| LoadError::InvalidPattern {
                context: context.to_string(),
                pattern: kind.pattern().to_string(),
                source: e,
            })?;
            Ok(RuleFunction::Casing { kind, regex })
        }
        "alphabetical" => Ok(RuleFunction::Alphabetical {
            keyed_by: options.string("keyedBy")?.map(String::from),
        }),
        _ => Err(LoadError::UnknownFunction {
            context: context.to_string(),
            name: name.to_string(),
        }),
    }
}

fn scalar_to_string(value: &Yaml) -> Option<String> {
    match value {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Compiles a pattern, accepting `/body/flags` as well as a bare regex.
fn compile_pattern(pattern: &str, context: &str) -> Result<Regex, LoadError> {
    let normalized = match pattern.strip_prefix('/').and_then(|p| p.rsplit_once('/')) {
        Some((body, flags)) if flags.chars().all(|c| matches!(c, 'i' | 'm' | 's' | 'u' | 'g')) => {
            let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm' | 's')).collect();
            if inline.is_empty() {
                body.to_string()
            } else {
                format!("(?{inline}){body}")
            }
        }
        _ => pattern.to_string(),
    };
    Regex::new(&normalized).map_err(|e| LoadError::InvalidPattern {
        context: context.to_string(),
        pattern: pattern.to_string(),
        source: e,
    })
}
