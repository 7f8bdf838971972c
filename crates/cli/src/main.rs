// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `yawl` CLI: bootstraps the engine daemon. `start` runs it in the
//! foreground until a shutdown signal; `stop`/`status` operate on an
//! already-running instance via its lock file (§6).

use clap::{Parser, Subcommand};
use yawl::commands::{start, status, stop};
use yawl::ExitError;

#[derive(Parser)]
#[command(name = "yawl", version, about = "YAWL workflow engine")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon and serve Interfaces A/B/E/X until shutdown.
    Start,
    /// Signal a running daemon to shut down gracefully.
    Stop,
    /// Report whether a daemon instance is running.
    Status,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Start) {
        Command::Start => start::start().await,
        Command::Stop => stop::stop(),
        Command::Status => status::status(),
    };

    if let Err(err) = result {
        eprintln!("yawl: {err}");
        std::process::exit(err.code);
    }
}
