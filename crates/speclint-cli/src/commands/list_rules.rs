//! List rules command implementation.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use speclint_core::Ruleset;
use speclint_rules::Builtins;

use crate::pipeline;

/// Runs the list-rules command.
///
/// # Errors
///
/// Returns an error if the ruleset cannot be resolved.
pub async fn run(ruleset: &str, workspace: &Path) -> Result<()> {
    let engine = pipeline::build_engine(ruleset, workspace, &Builtins)
        .await
        .with_context(|| format!("Failed to load ruleset `{ruleset}`"))?;
    print!("{}", render(engine.ruleset()));
    Ok(())
}

/// Renders the rule table.
#[must_use]
pub fn render(ruleset: &Ruleset) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Available rules:\n");
    let _ = writeln!(out, "{:<40} {:<8} {:<8} Description", "Name", "Severity", "Enabled");
    let _ = writeln!(out, "{}", "-".repeat(80));

    for rule in ruleset.rules() {
        let line = format!(
            "{:<40} {:<8} {:<8} {}",
            rule.name(),
            rule.severity().to_string(),
            if rule.is_enabled() { "yes" } else { "no" },
            rule.description().unwrap_or_default()
        );
        let _ = writeln!(out, "{}", line.trim_end());
    }

    let _ = writeln!(
        out,
        "\n{} of {} rule(s) enabled",
        ruleset.enabled_count(),
        ruleset.rules().len()
    );
    out
}
