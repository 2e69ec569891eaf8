//! # speclint-rules
//!
//! Built-in rulesets for speclint.
//!
//! ## Available Rulesets
//!
//! | Name | Formats | Description |
//! |------|---------|-------------|
//! | `speclint:oas` | oas2, oas3 | Style and completeness rules for OpenAPI documents |
//!
//! Rulesets written for older tooling may reference `spectral:oas`,
//! `spectral:oas2` or `spectral:oas3`; all resolve to `speclint:oas`.
//!
//! ## Usage
//!
//! ```ignore
//! use speclint_core::{Engine, RulesetLocator, RulesetResolver};
//! use speclint_rules::Builtins;
//!
//! let resolver = RulesetResolver::new(&Builtins, workspace)?;
//! let ruleset = resolver
//!     .resolve(&RulesetLocator::Builtin("speclint:oas".into()))
//!     .await?;
//! let engine = Engine::new(ruleset);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod presets;

pub use presets::Builtin;

use speclint_core::BuiltinRulesets;

/// Registry of the rulesets compiled into this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Builtins;

impl BuiltinRulesets for Builtins {
    fn source(&self, name: &str) -> Option<&'static str> {
        let builtin = Builtin::from_name(name);
        if builtin.is_none() {
            tracing::debug!(name, "No built-in ruleset with this name");
        }
        builtin.map(Builtin::source)
    }}

/// Re-export core types for convenience.
pub use speclint_core::{Ruleset, Severity};
