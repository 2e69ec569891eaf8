//! # speclint-cli
//!
//! The `speclint-action` binary and the pieces it is assembled from:
//!
//! - [`config`]: action inputs decoded from the environment
//! - [`files`]: glob expansion and concurrent reads
//! - [`pipeline`]: lint, annotate and report on a check run
//! - [`commands`]: `run`, `lint` and `list-rules`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod commands;
pub mod config;
pub mod files;
pub mod pipeline;

/// Output format for local lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
    /// Source snippets with labels.
    Pretty,
}
