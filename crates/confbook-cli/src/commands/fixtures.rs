//! Fixtures command
//!
//! Load the demo conferences and comment into storage.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::CliContext;
use confbook_core::fixtures;

/// Arguments for the fixtures command
#[derive(Debug, Args)]
pub struct FixturesArgs {
    /// Skip confirmation
    #[arg(long, short)]
    pub yes: bool,

    /// Keep existing data instead of purging it first
    #[arg(long)]
    pub append: bool,
}

/// Execute the fixtures command
pub fn execute(args: FixturesArgs, ctx: &CliContext) -> Result<()> {
    if !args.yes && !args.append {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt("Careful, existing data will be purged. Continue?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("Fixtures cancelled.");
            return Ok(());
        }
    }

    let backend = ctx.backend()?;
    let summary = fixtures::load(backend.storage.as_ref(), args.append)
        .context("Failed to load fixtures")?;

    println!(
        "{} Loaded {} conferences and {} comment(s)",
        "✓".green(),
        summary.conferences,
        summary.comments
    );
    Ok(())
}
