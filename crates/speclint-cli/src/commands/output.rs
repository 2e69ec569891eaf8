//! Shared output formatting for lint results.

use std::fmt::Write;

use anyhow::Result;
use speclint_core::{DiagnosticReport, LintResult, Severity};

use crate::files::FileWithContent;
use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `sources` holds the linted documents keyed by the same path the
/// diagnostics carry; only [`OutputFormat::Pretty`] reads them.
pub fn print(
    result: &LintResult,
    sources: &[FileWithContent],
    format: OutputFormat,
) -> Result<()> {
    print!("{}", render(result, sources, format)?);
    Ok(())
}

/// Renders lint results in the specified format.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render(
    result: &LintResult,
    sources: &[FileWithContent],
    format: OutputFormat,
) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => serde_json::to_string_pretty(result)? + "\n",
        OutputFormat::Compact => render_compact(result),
        OutputFormat::Pretty => render_pretty(result, sources),
    })
}

fn render_text(result: &LintResult) -> String {
    let counts = result.count_by_severity();
    let mut out = String::new();

    for diagnostic in &result.diagnostics {
        let severity_indicator = match diagnostic.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warn => "\x1b[33mwarn\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
            Severity::Hint => "\x1b[36mhint\x1b[0m",
        };

        out.push_str(&diagnostic.format(severity_indicator));
        out.push('\n');
    }

    let summary_color = if counts.errors > 0 {
        "\x1b[31m"
    } else if counts.warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{}Found {} error(s), {} warning(s), {} info(s), {} hint(s) in {} file(s)\x1b[0m",
        summary_color,
        counts.errors,
        counts.warnings,
        counts.infos,
        counts.hints,
        result.files_checked
    );
    out
}

fn render_compact(result: &LintResult) -> String {
    result
        .diagnostics
        .iter()
        .map(|d| format!("{d}\n"))
        .collect()
}

fn render_pretty(result: &LintResult, sources: &[FileWithContent]) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        let source = sources
            .iter()
            .find(|f| diagnostic.source.as_deref() == Some(f.path.as_path()));
        match source {
            Some(file) => {
                let name = file.path.display().to_string();
                let report =
                    miette::Report::new(DiagnosticReport::new(diagnostic, &name, &file.content));
                let _ = writeln!(out, "{report:?}");
            }
            None => {
                let _ = writeln!(out, "{diagnostic}");
            }
        }
    }
    out + &render_text(&LintResult {
        diagnostics: Vec::new(),
        files_checked: result.files_checked,
    })
}
