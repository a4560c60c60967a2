//! Workspace automation for relay routing
//!
//! Run with: cargo run -p xtask -- <command>

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Fuzz targets declared in `fuzz/Cargo.toml`
const FUZZ_TARGETS: &[&str] = &["fuzz_prefix_parse", "fuzz_instance_selection"];

/// Example configuration shipped with the CLI
const EXAMPLE_CONFIG: &str = "crates/relay-routing-cli/config.example.toml";

#[derive(Parser)]
#[command(name = "xtask", about = "Relay routing workspace tasks")]
struct Cli {
    #[command(subcommand)]
    command: Task,
}

#[derive(Subcommand)]
enum Task {
    /// Format check, clippy, tests and the example config check
    Ci,

    /// Validate the shipped example configuration with `relay-route check`
    CheckExample,

    /// Run the routing benchmarks
    Bench,

    /// Run fuzz targets with cargo-fuzz (nightly)
    Fuzz {
        /// Single target to run; all targets when omitted
        target: Option<String>,

        /// Seconds to spend on each target
        #[arg(long, default_value_t = 60)]
        seconds: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let root = workspace_root();

    match Cli::parse().command {
        Task::Ci => {
            cargo(&root, &["fmt", "--all", "--check"])?;
            cargo(&root, &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            cargo(&root, &["test", "--workspace"])?;
            check_example(&root)?;
        }
        Task::CheckExample => check_example(&root)?,
        Task::Bench => cargo(&root, &["bench", "-p", "relay-routing"])?,
        Task::Fuzz { target, seconds } => {
            let targets = fuzz_targets(target.as_deref())?;
            let max_time = format!("-max_total_time={seconds}");
            for target in targets {
                cargo(
                    &root.join("fuzz"),
                    &["+nightly", "fuzz", "run", target, "--", &max_time],
                )?;
            }
        }
    }

    Ok(())
}

/// Workspace root, one level above this crate
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn check_example(root: &Path) -> anyhow::Result<()> {
    cargo(
        root,
        &["run", "-q", "-p", "relay-routing-cli", "--", "--config", EXAMPLE_CONFIG, "check"],
    )
}

/// Resolve the requested fuzz target, or every target when none is named
fn fuzz_targets(requested: Option<&str>) -> anyhow::Result<Vec<&'static str>> {
    match requested {
        None => Ok(FUZZ_TARGETS.to_vec()),
        Some(name) => FUZZ_TARGETS
            .iter()
            .find(|t| **t == name)
            .map(|t| vec![*t])
            .with_context(|| {
                format!("unknown fuzz target {name}; known: {}", FUZZ_TARGETS.join(", "))
            }),
    }
}

fn cargo(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let status = Command::new(&cargo)
        .current_dir(dir)
        .args(args)
        .status()
        .with_context(|| format!("failed to spawn {cargo}"))?;

    anyhow::ensure!(status.success(), "cargo {} exited with {status}", args.join(" "));
    Ok(())
}
