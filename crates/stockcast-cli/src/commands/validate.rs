//! Validate Command Implementation

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::pipeline;

/// Check a configuration and print the model summary
///
/// Runs the hyperparameter, date-ordering and shape checks that `train`
/// runs before touching any data.
#[derive(Args, Debug, Clone)]
pub struct ValidateCommand {
    /// Path to the pipeline configuration file (JSON format)
    #[arg(long, short = 'c', env = "STOCKCAST_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ValidateCommand {
    /// Returns the model summary of a valid configuration.
    pub fn check(&self) -> Result<String> {
        let config = pipeline::load_config(self.config.as_deref())?;
        let model = pipeline::preflight(&config).context("Invalid configuration")?;
        Ok(model.summary())
    }

    /// Execute the validate command
    pub fn run(&self) -> Result<()> {
        let summary = self.check()?;
        println!("{}", summary);
        println!("Configuration is valid");
        Ok(())
    }
}
