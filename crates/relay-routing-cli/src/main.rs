//! relay-route CLI
//!
//! Runs the relay router against tables loaded from a configuration file.

mod config;

use clap::{Parser, Subcommand};
use relay_routing::SelectionMode;
use std::net::IpAddr;
use std::path::PathBuf;
use uuid::Uuid;

use config::Config;

/// relay-route - pick TURN relays for a calling client
#[derive(Parser)]
#[command(name = "relay-route")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute relay options for a client
    Route {
        /// Account identifier of the caller
        #[arg(short, long)]
        identity: Uuid,

        /// Client IP address; omit to get generic relays
        #[arg(short = 'a', long)]
        client: Option<IpAddr>,

        /// Maximum number of relay instances
        #[arg(short, long)]
        limit: Option<usize>,

        /// Pick instances in DNS order instead of at random
        #[arg(long)]
        stable: bool,
    },

    /// Validate the configuration file
    Check,

    /// Summarize the loaded tables
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Route {
            identity,
            client,
            limit,
            stable,
        } => {
            route(identity, client, limit, stable, &config)?;
        }
        Commands::Check => {
            check(&config);
        }
        Commands::Show => {
            show(&config);
        }
    }

    Ok(())
}

/// Route a single client and print the options as JSON
fn route(
    identity: Uuid,
    client: Option<IpAddr>,
    limit: Option<usize>,
    stable: bool,
    config: &Config,
) -> anyhow::Result<()> {
    let mode = if stable {
        SelectionMode::Stable
    } else {
        config.selection_mode()
    };
    let limit = limit.unwrap_or(config.router.instance_limit);

    tracing::info!(
        "Routing {} from {:?} (limit: {}, mode: {:?})",
        identity,
        client,
        limit,
        mode
    );

    let router = config.build_router(mode);
    let options = router.route(&identity, client, limit)?;

    println!("{}", serde_json::to_string_pretty(&options)?);
    Ok(())
}

/// Report configuration problems that do not stop routing
fn check(config: &Config) {
    let missing = config.unresolved_datacenters();
    if missing.is_empty() {
        println!("Configuration OK");
    } else {
        tracing::warn!(
            "Routing tables name datacenters without DNS records: {}",
            missing.join(", ")
        );
        println!(
            "Configuration OK ({} datacenters without DNS records)",
            missing.len()
        );
    }
}

/// Print a summary of the configuration
fn show(config: &Config) {
    println!("Relay Routing");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("TURN:");
    println!("  Hostname: {}", config.turn.hostname);
    println!("  Randomize rate: {}", config.turn.randomize_rate);
    println!("  URI sets: {}", config.turn.uri_sets.len());
    println!(
        "  Enrolled identities: {}",
        config
            .turn
            .uri_sets
            .iter()
            .map(|set| set.enrolled.len())
            .sum::<usize>()
    );
    println!();

    println!("Router:");
    println!("  Instance limit: {}", config.router.instance_limit);
    println!("  Selection: {:?}", config.selection_mode());
    println!();

    println!("Tables:");
    println!("  Datacenters with DNS records: {}", config.dns.len());
    println!(
        "  Manual routes: {} subnet, {} geo",
        config.manual.subnets.len(),
        config.manual.routes.len()
    );
    println!(
        "  Performance routes: {} subnet, {} geo",
        config.performance.subnets.len(),
        config.performance.routes.len()
    );
    println!("  Geo prefixes: {}", config.geo.len());
}
