//! seance-archive CLI - incremental archiver for Council of State sessions.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use seance_archive::cli::{self, Overrides};
use seance_archive::config::load_config;
use seance_archive::core::Phases;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seance-archive")]
#[command(author, version, about = "Incremental archiver for Council of State sessions", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (defaults to ~/.seance-archive/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the store and downloaded files.
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Discovery bounds shared by `run` and `discover`.
#[derive(clap::Args)]
struct DiscoveryArgs {
    /// Re-scan the whole listing, ignoring already-known sessions.
    #[arg(long)]
    relist: bool,

    /// Maximum number of listing pages to visit.
    #[arg(long)]
    max_pages: Option<usize>,

    /// Ignore sessions dated before this day (YYYY-MM-DD).
    #[arg(long, conflicts_with = "no_stop_date")]
    stop_date: Option<NaiveDate>,

    /// Walk the listing without a stop date.
    #[arg(long)]
    no_stop_date: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover, extract and download.
    Run {
        #[command(flatten)]
        discovery: DiscoveryArgs,

        /// Download every file regardless of name patterns.
        #[arg(long)]
        all_files: bool,
    },

    /// Discover new sessions only.
    Discover {
        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Extract discussions and files of pending sessions.
    Extract,

    /// Download files of stored sessions.
    Download {
        /// Download every file regardless of name patterns.
        #[arg(long)]
        all_files: bool,
    },

    /// Show a summary of the store.
    Status {
        /// Maximum number of sessions to show. Defaults to 10.
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl DiscoveryArgs {
    fn overrides(&self, output_dir: Option<PathBuf>) -> Overrides {
        Overrides {
            output_dir,
            max_pages: self.max_pages,
            stop_date: self.stop_date,
            no_stop_date: self.no_stop_date,
            all_files: false,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("seance-archive: error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let base = Overrides {
        output_dir: cli.output_dir.clone(),
        ..Overrides::default()
    };

    let result = match cli.command {
        Commands::Run {
            discovery,
            all_files,
        } => {
            Overrides {
                all_files,
                ..discovery.overrides(cli.output_dir)
            }
            .apply(&mut config);
            cli::run::run(&config, Phases::All, discovery.relist)
        }
        Commands::Discover { discovery } => {
            discovery.overrides(cli.output_dir).apply(&mut config);
            cli::run::run(&config, Phases::Discover, discovery.relist)
        }
        Commands::Extract => {
            base.apply(&mut config);
            cli::run::run(&config, Phases::Extract, false)
        }
        Commands::Download { all_files } => {
            Overrides { all_files, ..base }.apply(&mut config);
            cli::run::run(&config, Phases::Download, false)
        }
        Commands::Status { limit } => {
            base.apply(&mut config);
            cli::status::run(&config, limit)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("seance-archive: error: {e}");
            ExitCode::FAILURE
        }
    }
}
