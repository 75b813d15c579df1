//! ClipCut command-line video clipper
//!
//! # Usage
//!
//! ```bash
//! clipcut download --link "https://youtu.be/abc" --owner u1 --start 00:01:00 --end 00:01:30
//! clipcut list --owner u1
//! clipcut batch --file requests.json --jobs 4
//! clipcut sweep --older-than-secs 3600
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use clipcut::adapters::init_tracing;
use clipcut::cli::{commands, Cli, Commands};
use clipcut::config_initialization::initialize_configuration_hierarchy;

/// Main entry point for the ClipCut CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(&cli.log_level, cli.log_format)?;

    info!("Starting ClipCut");

    let config = initialize_configuration_hierarchy(&cli)?;

    // Execute the requested command
    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            commands::download(&config, args).await?;
        }
        Commands::List(args) => {
            info!("Executing list command");
            commands::list(&config, args).await?;
        }
        Commands::Batch(args) => {
            info!("Executing batch command");
            commands::batch(&config, args).await?;
        }
        Commands::Sweep(args) => {
            info!("Executing sweep command");
            commands::sweep(&config, args)?;
        }
        Commands::Config => commands::show_config(&config)?,
    }

    info!("ClipCut completed successfully");
    Ok(())
}
