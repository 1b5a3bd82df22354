//! stockcast - train LSTM forecasters on daily price series and run them.

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stockcast_cli::commands::interrupted_epochs;
use stockcast_cli::{Cli, Commands};

/// Exit status of a run stopped by Ctrl-C.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("stockcast=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train(cmd) => {
            if let Err(e) = cmd.run() {
                if let Some(completed_epochs) = interrupted_epochs(&e) {
                    warn!(completed_epochs, "Training interrupted, no run was saved");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
                return Err(e);
            }
        }
        Commands::Predict(cmd) => cmd.run()?,
        Commands::Validate(cmd) => cmd.run()?,
    }

    info!("stockcast completed successfully");
    Ok(())
}
