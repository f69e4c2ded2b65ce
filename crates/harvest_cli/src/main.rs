mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use harvest_logging::{harvest_error, LevelFilter, LogDestination};

use crate::config::Overrides;

#[derive(Parser, Debug)]
#[command(author, version, about = "Collects random encyclopedia articles into rotating JSONL batches", long_about = None)]
struct Cli {
    /// RON configuration file; every field is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Progress record location (overrides `paths.state_file`).
    #[arg(long, global = true)]
    state: Option<PathBuf>,
    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one collection cycle.
    Run {
        /// Articles to collect this cycle.
        #[arg(long)]
        articles: Option<usize>,
        /// Directory batch files are written to.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Create the progress record for a fresh deployment.
    Init {
        #[arg(long, default_value_t = 1)]
        file_number: u64,
        #[arg(long, default_value_t = 1)]
        repo_index: u64,
    },
    /// Print the progress record and whether rotation is due.
    Status,
    /// Rotate to the next storage repository now.
    Rotate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let destination = match &cli.log_file {
        Some(path) => LogDestination::TerminalAndFile(path.clone()),
        None => LogDestination::Terminal,
    };
    harvest_logging::initialize(destination, level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            harvest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> anyhow::Result<()> {
    let mut overrides = Overrides {
        state_file: cli.state,
        ..Overrides::default()
    };
    if let Command::Run { articles, output } = &cli.command {
        overrides.articles_per_cycle = *articles;
        overrides.output_dir = output.clone();
    }
    let config = config::load(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Command::Run { .. } => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(commands::run(&config)).map(|_| ())
        }
        Command::Init {
            file_number,
            repo_index,
        } => commands::init(&config, file_number, repo_index),
        Command::Status => {
            for line in commands::status(&config)? {
                println!("{line}");
            }
            Ok(())
        }
        Command::Rotate => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
            runtime.block_on(commands::rotate(&config))
        }
    }
}
