use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use linkreload::{ReferenceKind, commands};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "linkreload",
    version,
    about = "Batch reload of families, CAD links and model links"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List candidate files in the configured library
    Library {
        /// Kind of reference the candidates replace
        #[arg(long, value_enum, default_value = "family")]
        kind: ReferenceKind,
    },
    /// Resolve a reference name against the library (exit 2 if not unique)
    Resolve {
        /// Reference display name
        name: String,
        /// Kind of reference being resolved
        #[arg(long, value_enum, default_value = "family")]
        kind: ReferenceKind,
    },
    /// Summarize a tab-separated report file
    Report {
        /// Report file
        file: PathBuf,
        /// Only print records of this host file
        #[arg(long)]
        host: Option<PathBuf>,
    },
    /// Dry-run a reload: resolve every name listed in a report
    Plan {
        /// Report file listing the references
        file: PathBuf,
        /// Kind of reference listed in the report
        #[arg(long, value_enum)]
        kind: ReferenceKind,
        /// Column holding the reference name (defaults to the name column)
        #[arg(long)]
        column: Option<usize>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Library { kind } => commands::library(kind).map(|()| ExitCode::SUCCESS),
        Commands::Resolve { name, kind } => commands::resolve(&name, kind),
        Commands::Report { file, host } => {
            let host = host.map(|h| h.display().to_string());
            commands::report(&file, host.as_deref()).map(|()| ExitCode::SUCCESS)
        },
        Commands::Plan { file, kind, column } => commands::plan(&file, kind, column),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}
