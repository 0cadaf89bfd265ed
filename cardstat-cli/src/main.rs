use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod analyze_cmd;
mod config;
mod display;
mod inspect;
mod prompt;
mod state;
mod totals_cmd;

#[derive(Parser, Debug)]
#[command(
    name = "cardstat",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CARDSTAT_BUILD_SHA"), ")"),
    about = "Credit-card statement scraper, categorizer and reconciler"
)]
struct Cli {
    /// Config file (default: ~/.cardstat/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, categorize and reconcile statement PDFs
    Analyze(analyze_cmd::AnalyzeArgs),

    /// Recompute category totals from transaction CSVs using the master file
    Totals(totals_cmd::TotalsArgs),

    /// Show what the parsers see in a statement (layout, summary, lines)
    Inspect {
        /// Statement PDF (or a .txt dump of one)
        pdf: PathBuf,
    },

    /// Manage ~/.cardstat/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
    /// Print the config file location
    Path,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let config_override = cli.config.as_deref();

    match cli.command {
        Command::Analyze(args) => {
            let cfg = config::load_config(config_override)?;
            analyze_cmd::run(args, &cfg)?;
        }

        Command::Totals(args) => {
            let cfg = config::load_config(config_override)?;
            totals_cmd::run(args, &cfg)?;
        }

        Command::Inspect { pdf } => {
            let cfg = config::load_config(config_override)?;
            inspect::run(&pdf, &cfg)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(config_override)?,
            ConfigCommand::Show => config::show_config(config_override)?,
            ConfigCommand::Path => println!("{}", config::config_path(config_override)?.display()),
        },
    }

    Ok(())
}
