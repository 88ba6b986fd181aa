//! Serve command
//!
//! Run the guestbook web server.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use super::CliContext;
use confbook_core::fixtures;
use confbook_core::messaging::MemoryDispatcher;
use confbook_core::notify::TracingNotifier;
use confbook_core::photo::MemoryPhotoStore;
use confbook_core::service::{CommentService, ReviewUrls};
use confbook_core::store::MemoryStore;
use confbook_web::AppState;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (overrides server.bind)
    #[arg(long, short)]
    pub bind: Option<String>,

    /// Keep everything in memory, preloaded with the demo data
    #[arg(long)]
    pub ephemeral: bool,
}

/// Execute the serve command
pub fn execute(args: ServeArgs, ctx: &CliContext) -> Result<()> {
    let config = ctx.config.clone();
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    let state = if args.ephemeral {
        ephemeral_state(&ctx.config)?
    } else {
        let backend = ctx.backend()?;
        AppState::new(config, backend.service, backend.storage)
    };

    println!(
        "🚀 Serving confbook on {}{}",
        bind.cyan(),
        if args.ephemeral { " (ephemeral)" } else { "" }
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime
        .block_on(confbook_web::serve(state, &bind))
        .with_context(|| format!("Server on {} failed", bind))
}

fn ephemeral_state(config: &confbook_core::config::Config) -> Result<AppState> {
    let store = Arc::new(MemoryStore::new());
    fixtures::load(store.as_ref(), false).context("Failed to load fixtures")?;

    let service = CommentService::with_config(
        store.clone(),
        Arc::new(MemoryDispatcher::new()),
        Arc::new(TracingNotifier),
        Arc::new(MemoryPhotoStore::new()),
        ReviewUrls::new(config.server.base_url.clone()),
        &config.comments,
    );
    Ok(AppState::new(config.clone(), Arc::new(service), store))
}
