//! Declarative rulesets loaded from YAML or JSON.
//!
//! Rulesets are data only: rules select nodes with a path expression and
//! apply one of the built-in functions to them.
//!
//! # Architecture
//!
//! ```text
//! ruleset text (builtin / file / URL)
//!   ↓ serde (DTO layer)
//! dto types
//!   ↓ migrate legacy spellings
//!   ↓ resolve `extends` recursively
//!   ↓ validate + convert + merge
//! Ruleset (pure domain model)
//!   ↓ Engine::new()
//! LintEngine
//! ```

pub mod dto;
pub mod loader;
pub mod migrate;
pub mod model;
pub mod resolve;

pub use loader::{ExtendsMode, LoadError};
pub use model::{Field, Rule, Ruleset, Then};
pub use resolve::{
    default_ruleset_file, locate, BuiltinRulesets, ResolveError, RulesetLocator, RulesetResolver,
    DEFAULT_RULESET_FILES,
};

/// Errors from parsing and loading a standalone ruleset.
#[derive(Debug, thiserror::Error)]
pub enum LoadRulesetError {
    /// YAML/JSON deserialization failed.
    #[error("ruleset parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Domain model validation failed.
    #[error("{0}")]
    Load(#[from] LoadError),
}

/// Parses ruleset text that has no `extends`.
///
/// Any `extends` entries are ignored; use [`RulesetResolver`] to follow
/// them.
///
/// # Errors
///
/// Returns an error if parsing or model validation fails.
pub fn load_ruleset_from_str(content: &str) -> Result<Ruleset, LoadRulesetError> {
    let dto = migrate::migrate(dto::parse(content)?)?;
    Ok(loader::load(dto, Vec::new())?)
}
