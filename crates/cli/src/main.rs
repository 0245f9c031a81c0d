use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use contract_triage::commands::{index_command, list_producers_command, IndexArgs};
use contract_triage::init_logging;

/// First-pass triage of Solidity smart-contract source.
///
/// This CLI is a thin wrapper around `triage-core` (exposed in code as
/// `triage_core`). All substantive logic lives in the library so it can be
/// tested without a compiler installed.
#[derive(Parser, Debug)]
#[command(
    name = "contract-triage",
    version,
    about = "First-pass triage indexer for Solidity source",
    long_about = None
)]
struct Cli {
    /// Log decisions (skipped files, policy drops, fallback) at debug level.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index a scope and report contracts, entrypoints, or sinks.
    ///
    /// Output goes to stdout as Markdown unless `--out` names a .md or .json
    /// file.
    Index(IndexArgs),

    /// List the available producers.
    Producers {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Command::Index(args) => index_command(&args)?,
        Command::Producers { json } => {
            list_producers_command(json)?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}
