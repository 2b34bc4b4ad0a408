//! asset-bridge CLI - Bower and npm packages as host packages

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod console;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("asset_bridge=debug")
    } else {
        EnvFilter::new("asset_bridge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let global = cli.global_options();

    // Execute command
    match cli.command {
        Commands::Show(args) => commands::show::execute(args, &global),
        Commands::Search(args) => commands::search::execute(args, &global),
        Commands::Convert(args) => commands::convert::execute(args),
        Commands::Repositories => commands::repositories::execute(&global),
    }
}
