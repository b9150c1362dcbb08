use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kwgn_core::log_format;
use kwgn_finance::{rows_from_results, write_csv};

mod config;
mod process;
mod state;

use process::{ProcessArgs, is_stdout};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("KWGN_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(
    name = "kwgn-batch",
    version = VERSION,
    about = "Batch bank-statement extraction on top of the kwgn engine"
)]
struct Cli {
    /// Debug logging (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract statements and print a per-file report
    Process {
        /// Statement files for the first batch
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Files for a follow-up batch in the same session (repeatable)
        #[arg(long = "add", value_name = "FILE")]
        add: Vec<PathBuf>,

        /// Write all transactions as CSV ("-" for stdout)
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,

        /// Save the session's text log
        #[arg(long, value_name = "PATH")]
        log: Option<PathBuf>,

        /// Print file summaries, daily flow and the categorical flow
        #[arg(long)]
        summary: bool,
    },

    /// Rebuild CSV rows from a saved text log
    Replay {
        log: PathBuf,

        /// CSV destination (default: stdout)
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },

    /// Check that the engine command is reachable and show the settings in effect
    Check,

    /// Manage ~/.kwgn/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config unless one exists
    Init,
    /// Print the effective configuration
    Show,
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Process {
            files,
            add,
            csv,
            log,
            summary,
        } => {
            let cfg = config::load_config()?;
            process::run_process(
                &cfg,
                ProcessArgs {
                    files,
                    add,
                    csv,
                    log,
                    summary,
                },
            )
            .await?;
        }

        Command::Replay { log, csv } => replay(&log, csv)?,

        Command::Check => check()?,

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },
    }

    Ok(())
}

fn replay(log: &Path, csv: Option<PathBuf>) -> Result<()> {
    let text = fs::read_to_string(log).with_context(|| format!("read {}", log.display()))?;
    let results = log_format::decode(&text);
    let rows = rows_from_results(&results);

    match csv.filter(|p| !is_stdout(p)) {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
            write_csv(BufWriter::new(file), &rows)?;
            println!(
                "Replayed {} blocks, {} rows written to {}",
                results.len(),
                rows.len(),
                path.display()
            );
        }
        None => {
            write_csv(std::io::stdout().lock(), &rows)?;
            eprintln!("Replayed {} blocks, {} rows", results.len(), rows.len());
        }
    }
    Ok(())
}

fn check() -> Result<()> {
    let cfg = config::load_config()?;
    let engine = &cfg.engine;

    println!("kwgn-batch {VERSION}");
    println!("config file: {}", config::config_path()?.display());
    match engine.resolved_config_path() {
        Some(p) => println!("engine config: {}", p.display()),
        None => println!("engine config: (engine default)"),
    }
    let kwgn = engine.build_engine();
    println!("timeout: {}s", kwgn.timeout().as_secs());
    println!("strategies:");
    for strategy in engine.strategies()? {
        println!("  {} ({})", strategy.key(), strategy.name());
    }
    match &engine.scratch_dir {
        Some(dir) => println!("scratch dir: {}", dir.display()),
        None => println!("scratch dir: {}", std::env::temp_dir().display()),
    }

    let command = kwgn.command();
    match which::which(command) {
        Ok(path) => {
            println!("engine: {} ({})", command.display(), path.display());
            Ok(())
        }
        Err(_) => bail!("engine command not found on PATH: {}", command.display()),
    }
}
