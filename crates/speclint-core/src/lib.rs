//! # speclint-core
//!
//! Core framework for linting API description documents.
//!
//! This crate provides:
//!
//! - [`Diagnostic`] and friends for representing lint findings
//! - [`Document`] parsing with source positions for every node
//! - [`JsonPath`], the path subset rules use to select nodes
//! - [`ruleset`] for declarative rulesets (DTOs, loader, `extends` resolution)
//! - [`LintEngine`] and the declarative [`Engine`]
//!
//! ## Example
//!
//! ```ignore
//! use speclint_core::{Engine, LintEngine, ruleset::load_ruleset_from_str};
//!
//! let ruleset = load_ruleset_from_str(RULES)?;
//! let engine = Engine::new(ruleset);
//! for diagnostic in engine.run(&source)? {
//!     println!("{diagnostic}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
mod engine;
pub mod functions;
pub mod path;
pub mod ruleset;
mod types;

pub use document::{Document, DocumentError, Format};
pub use engine::{Engine, EngineError, LintEngine};
pub use functions::{CasingKind, RuleFunction};
pub use path::{JsonPath, PathError, PathSegment};
pub use ruleset::{
    BuiltinRulesets, ResolveError, Rule, Ruleset, RulesetLocator, RulesetResolver,
};
pub use types::{
    offset_for, Diagnostic, DiagnosticReport, LintResult, Position, Range, Severity, SeverityCounts,
};
