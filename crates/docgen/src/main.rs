//! docgen CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "docgen")]
#[command(version)]
#[command(about = "Generate agent skills, docs and commands from markdown templates", long_about = None)]
struct Cli {
    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress console output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand every template and write the generated files
    Generate {
        /// Directory to start project discovery from (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Template directory, relative to the root
        #[arg(long = "source")]
        source_dir: Option<String>,

        /// Base directory for docs targets, relative to the root
        #[arg(long)]
        docs_dir: Option<String>,

        /// Directory for claude-command outputs, relative to the root
        #[arg(long)]
        claude_commands_dir: Option<String>,

        /// Template parameter (KEY=VALUE)
        #[arg(short = 'P', long = "param")]
        params: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "docgen=debug,docgen_core=debug"
    } else if cli.quiet {
        "warn"
    } else {
        "docgen=info,docgen_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Generate {
            root,
            source_dir,
            docs_dir,
            claude_commands_dir,
            params,
        } => commands::generate::execute(commands::generate::GenerateArgs {
            root,
            source_dir,
            docs_dir,
            claude_commands_dir,
            params,
            quiet: cli.quiet,
        }),
    }
}
