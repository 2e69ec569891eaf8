//! Subcommand implementations.

pub mod lint;
pub mod list_rules;
pub mod output;
pub mod run;
