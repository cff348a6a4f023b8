//! gatekey - reference relying-party CLI for U2F registration and login

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod store;
mod utils;

use commands::Context;
use config::CliConfig;
use store::Ceremony;

/// gatekey - FIDO U2F registration and authentication
#[derive(Parser)]
#[command(name = "gatekey", version, about)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Device store file (overrides the config file)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// App ID (overrides the config file)
    #[arg(long, global = true)]
    app_id: Option<String>,

    /// Trusted facet origin, repeatable (overrides the config file)
    #[arg(long = "facet", value_name = "ORIGIN", global = true)]
    facets: Vec<String>,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a challenge and print the browser request
    Challenge {
        #[command(subcommand)]
        ceremony: ChallengeKind,
    },

    /// Verify a registration response and store the device
    Register {
        /// RegisterResponse JSON file ("-" for stdin)
        #[arg(long)]
        response: Option<PathBuf>,
    },

    /// Verify a sign response and update the device counter
    Authenticate {
        /// SignResponse JSON file ("-" for stdin)
        #[arg(long)]
        response: Option<PathBuf>,
    },

    /// List registered devices
    Devices,

    /// Drop expired pending challenges
    Prune,
}

#[derive(Subcommand)]
enum ChallengeKind {
    /// Registration challenge for a new device
    Register,
    /// Sign challenge for registered devices
    Sign,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let ctx = context(&cli)?;
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Commands::Challenge { ceremony } => {
            let ceremony = match ceremony {
                ChallengeKind::Register => Ceremony::Register,
                ChallengeKind::Sign => Ceremony::Sign,
            };
            commands::challenge::issue(&ctx, ceremony, &mut stdout)
        }
        Commands::Register { response } => {
            let input = utils::read_input(response.as_deref())?;
            commands::register::run(&ctx, &input, &mut stdout)
        }
        Commands::Authenticate { response } => {
            let input = utils::read_input(response.as_deref())?;
            commands::authenticate::run(&ctx, &input, &mut stdout)
        }
        Commands::Devices => commands::devices::list(&ctx, &mut stdout),
        Commands::Prune => commands::devices::prune(&ctx, &mut stdout),
    }?;

    stdout.flush()?;
    Ok(())
}

/// Merge command-line overrides into the loaded config.
fn context(cli: &Cli) -> Result<Context> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(app_id) = &cli.app_id {
        config.app_id = Some(app_id.clone());
    }
    if !cli.facets.is_empty() {
        config.trusted_facets = cli.facets.clone();
    }
    if let Some(store) = &cli.store {
        config.store = Some(store.clone());
    }

    let store_path = config.store_path()?;
    tracing::debug!(store = %store_path.display(), "Using device store");
    Ok(Context {
        config,
        store_path,
        json: cli.json,
    })
}
