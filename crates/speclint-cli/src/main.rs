//! speclint GitHub Action.
//!
//! Usage:
//! ```bash
//! speclint-action                 # action mode, configured from the environment
//! speclint-action lint --glob '**/*.yaml' [--ruleset R] [--format F]
//! speclint-action list-rules [--ruleset R]
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use speclint_cli::commands;
use speclint_cli::config::Config;
use speclint_cli::OutputFormat;

/// Lint API descriptions and report the results as a GitHub check run
#[derive(Parser)]
#[command(name = "speclint-action")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the action against the event in the environment (default)
    Run,

    /// Lint local files and print the diagnostics
    Lint {
        /// Glob selecting the documents, relative to the workspace
        #[arg(short, long, env = "INPUT_FILE_GLOB")]
        glob: String,

        /// Ruleset name, path or URL (default: a ruleset file in the workspace)
        #[arg(short, long, env = "INPUT_RULESET", default_value = "")]
        ruleset: String,

        /// Workspace directory
        #[arg(short, long, env = "GITHUB_WORKSPACE", default_value = ".")]
        workspace: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List the rules of a ruleset
    ListRules {
        /// Ruleset name, path or URL
        #[arg(short, long, default_value = "speclint:oas")]
        ruleset: String,

        /// Directory relative ruleset paths resolve against
        #[arg(short, long, default_value = ".")]
        workspace: PathBuf,
    },
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn exit_code(result: anyhow::Result<ExitCode>) -> ExitCode {
    result.unwrap_or_else(|e| {
        tracing::error!("{e:#}");
        ExitCode::FAILURE
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = Config::from_env();
            init_tracing(cli.verbose || config.as_ref().is_ok_and(|c| c.debug));
            match config {
                Ok(config) => commands::run::run(&config).await,
                Err(e) => {
                    tracing::error!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Lint {
            glob,
            ruleset,
            workspace,
            format,
        } => {
            init_tracing(cli.verbose);
            exit_code(commands::lint::run(&glob, &ruleset, &workspace, format).await)
        }
        Commands::ListRules { ruleset, workspace } => {
            init_tracing(cli.verbose);
            exit_code(
                commands::list_rules::run(&ruleset, &workspace)
                    .await
                    .map(|()| ExitCode::SUCCESS),
            )
        }
    }
}
