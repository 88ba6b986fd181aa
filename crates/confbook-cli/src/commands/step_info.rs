//! Step-info command
//!
//! Print the git tags pointing at HEAD, cached for a short while.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::CliContext;
use confbook_core::step_info::{git_tags_at_head, StepInfoCache};

/// Arguments for the step-info command
#[derive(Debug, Args)]
pub struct StepInfoArgs {
    /// Repository to inspect (default: current directory)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Ignore the cached value
    #[arg(long)]
    pub refresh: bool,
}

/// Execute the step-info command
pub fn execute(args: StepInfoArgs, ctx: &CliContext) -> Result<()> {
    let cache = StepInfoCache::new(
        ctx.data_dir().join("cache").join("step_info.json"),
        ctx.config.cache.step_info_ttl,
    );
    if args.refresh {
        cache.invalidate()?;
    }

    let repo = args.repo.unwrap_or_else(|| PathBuf::from("."));
    let step = cache
        .get_or_compute(|| git_tags_at_head(&repo))
        .context("Failed to read git tags")?;

    print!("{}", step);
    Ok(())
}
