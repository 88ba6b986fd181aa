//! Init command
//!
//! Create the configuration file and the data directories.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::fs;

use super::CliContext;
use confbook_core::config::Config;

/// Arguments for the init command
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(long)]
    pub force: bool,
}

/// Execute the init command
pub fn execute(args: InitArgs, ctx: &CliContext) -> Result<()> {
    if ctx.config_path.exists() && !args.force {
        eprintln!(
            "{} confbook already initialized at {}. Use --force to reinitialize.",
            "⚠".yellow(),
            ctx.config_path.display()
        );
        return Ok(());
    }

    let config = Config::default();
    config
        .save(&ctx.config_path)
        .with_context(|| format!("Failed to write {}", ctx.config_path.display()))?;
    println!(
        "{} Wrote configuration to {}",
        "✓".green(),
        ctx.config_path.display()
    );

    for dir in [
        config.storage.data_dir.clone(),
        config.storage.data_dir.join("outbox"),
        config.photo_dir(),
    ] {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    println!(
        "{} Created data directory {}",
        "✓".green(),
        config.storage.data_dir.display()
    );

    println!("\n{}", "Next steps:".bold());
    println!("  1. Load the demo data:  {}", "confbook fixtures".cyan());
    println!("  2. Start the server:    {}", "confbook serve".cyan());

    Ok(())
}
