//! Outbox command
//!
//! Inspect and hand off queued moderation messages.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::CliContext;
use confbook_core::messaging::Envelope;
use confbook_storage::Outbox;

/// Outbox subcommands
#[derive(Debug, Subcommand)]
pub enum OutboxCommand {
    /// List queued messages, oldest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove every queued message and print it as JSON lines
    Drain,
}

/// Execute the outbox command
pub fn execute(cmd: OutboxCommand, ctx: &CliContext) -> Result<()> {
    let outbox = Outbox::new(ctx.outbox_dir())?;

    match cmd {
        OutboxCommand::List { json } => list_messages(&outbox.list()?, json),
        OutboxCommand::Drain => {
            for envelope in outbox.drain()? {
                println!("{}", serde_json::to_string(&envelope)?);
            }
            Ok(())
        }
    }
}

fn list_messages(envelopes: &[Envelope], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(envelopes)?);
        return Ok(());
    }

    if envelopes.is_empty() {
        println!("Outbox is empty.");
        return Ok(());
    }

    println!("{}", "Queued messages:".bold().underline());
    println!();
    for envelope in envelopes {
        println!(
            "  {} {:<20} comment {}",
            envelope.enqueued_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
            envelope.message.kind().cyan(),
            envelope.message.comment_id()
        );
    }
    println!();
    println!("Total: {} message(s)", envelopes.len());
    Ok(())
}
