// ABOUTME: Entry point for the remexec CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use remexec::config::{self, ClientConfig};
use remexec::error::Result;
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    // stdout carries command output and bridge replies
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let cwd = env::current_dir()?;

    match cli.command {
        Commands::Init { force } => {
            let path = config::init_config(&cwd, force)?;
            println!("Created {}", path.display());
            Ok(0)
        }
        Commands::Run(args) => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::run_command(config, args).await
        }
        Commands::Serve => {
            let config = load_config(cli.config.as_deref(), &cwd)?;
            commands::serve_stdio(config).await?;
            Ok(0)
        }
    }
}

fn load_config(path: Option<&std::path::Path>, cwd: &std::path::Path) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load(path),
        None => ClientConfig::discover(cwd),
    }
}
