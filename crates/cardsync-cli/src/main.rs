mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, Ctx};
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cardsync",
    about = "Fetch card-set lookup records and keep them fresh",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from cardsync.yaml)
    #[arg(long, global = true, env = "CARDSYNC_ROOT")]
    root: Option<PathBuf>,

    /// Record directory (overrides data_dir from cardsync.yaml)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// API key sent with every request; unauthenticated when unset
    #[arg(long, global = true, env = "POKEMON_TCG_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log progress to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a single record and save it (fails if the fetch fails)
    Add {
        /// Record key, e.g. a set id such as base1
        key: String,
    },

    /// Re-fetch every stored record; failures keep the old data and never fail the run
    RefreshAll,

    /// List stored records
    List,

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    let ctx = Ctx {
        root: root::resolve_root(cli.root.as_deref()),
        dir: cli.dir,
        api_key: cli.api_key,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Add { key } => cmd::add::run(&ctx, &key),
        Commands::RefreshAll => cmd::refresh::run(&ctx),
        Commands::List => cmd::list::run(&ctx),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
