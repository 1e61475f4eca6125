//! Sneko: a terminal GUI for Ethereum smart contracts
//!
//! Browses a contracts directory, compiles Solidity and Vyper sources and
//! deploys them to a local test network.

mod clipboard;
mod tui;

use clap::Parser;
use eyre::{Context, Result};
use sneko_core::Config;
use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Sneko: a terminal GUI for Ethereum smart contracts

[Usage]
  sneko
  sneko [path]

[Options]
  -h, --help     Show this message and exit.
  -v, --version  Show the version and exit.

[Args]
  path  Path to a directory containing contracts
";

/// Contracts shipped with the binary, shown when no directory is given
const BUNDLED_CONTRACTS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/contracts");

#[derive(Parser, Debug)]
#[command(name = "sneko", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Run(Option<PathBuf>),
    Help,
    Version,
    TooMany,
}

/// Maps raw arguments to what the binary should do
fn interpret(args: &[String]) -> Invocation {
    match args {
        [] => Invocation::Run(None),
        [arg] => match arg.as_str() {
            "version" | "-v" | "--version" => Invocation::Version,
            "help" | "-h" | "--help" => Invocation::Help,
            path => Invocation::Run(Some(PathBuf::from(path))),
        },
        _ => Invocation::TooMany,
    }
}

fn contracts_root(explicit: Option<PathBuf>, config: &Config) -> PathBuf {
    explicit.unwrap_or_else(|| {
        if config.contracts_dir.is_dir() {
            config.contracts_dir.clone()
        } else {
            PathBuf::from(BUNDLED_CONTRACTS)
        }
    })
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    // stdout belongs to the terminal UI, so logs only go to a file
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("Cannot open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn run(path: Option<PathBuf>) -> Result<()> {
    let cwd = std::env::current_dir().wrap_err("Cannot read working directory")?;
    let mut config = Config::load(&cwd)?;
    init_logging(config.log_file.as_deref())?;

    let root = contracts_root(path, &config);
    if !root.is_dir() {
        eyre::bail!("{} is not a directory", root.display());
    }
    tracing::info!(root = %root.display(), "starting sneko");
    config.contracts_dir = root.clone();

    let mut app = tui::App::new(config, root)?;
    app.connect_network();
    tui::run(app)
}

fn main() {
    let cli = Cli::parse();

    let result = match interpret(&cli.args) {
        Invocation::Help => {
            print!("{HELP}");
            Ok(())
        }
        Invocation::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Invocation::TooMany => {
            eprintln!("Error: too many arguments. See 'sneko --help' for usage.");
            std::process::exit(1);
        }
        Invocation::Run(path) => run(path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
