//! Comment command
//!
//! Inspect comments and drive them through moderation.

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;

use super::CliContext;
use confbook_core::comment::{Comment, CommentState};
use confbook_core::service::SpamVerdict;
use confbook_core::store::{CommentStore, ConferenceStore};
use confbook_core::types::CommentId;
use confbook_core::workflow::{CommentWorkflow, StateMachine};

/// Spam classification given on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verdict {
    Ham,
    Spam,
}

impl From<Verdict> for SpamVerdict {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Ham => SpamVerdict::Ham,
            Verdict::Spam => SpamVerdict::Spam,
        }
    }
}

/// Comment subcommands
#[derive(Debug, Subcommand)]
pub enum CommentCommand {
    /// List comments
    List {
        /// Only comments of this conference (slug)
        #[arg(long)]
        conference: Option<String>,

        /// Only comments in this state
        #[arg(long)]
        state: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show comment details and the transitions it allows
    Show {
        /// Comment ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record the spam classification of a submitted comment
    Classify {
        /// Comment ID
        id: String,

        /// Classification
        #[arg(value_enum)]
        verdict: Verdict,
    },

    /// Accept or reject a classified comment
    Review {
        /// Comment ID
        id: String,

        /// Reject instead of accepting
        #[arg(long)]
        reject: bool,
    },

    /// Apply a workflow transition by name
    Apply {
        /// Comment ID
        id: String,

        /// Transition name (e.g. accept_as_ham)
        transition: String,
    },
}

/// Execute the comment command
pub fn execute(cmd: CommentCommand, ctx: &CliContext) -> Result<()> {
    let backend = ctx.backend()?;

    match cmd {
        CommentCommand::List {
            conference,
            state,
            json,
        } => {
            let state = state
                .map(|s| s.parse::<CommentState>())
                .transpose()
                .context("Invalid --state")?;
            let mut comments = match conference {
                Some(slug) => {
                    let conference = backend.storage.find_by_slug(&slug)?;
                    backend.storage.list_for_conference(&conference.id)?
                }
                None => backend.storage.list()?,
            };
            if let Some(state) = state {
                comments.retain(|c| c.state() == state);
            }
            list_comments(&comments, json)
        }
        CommentCommand::Show { id, json } => {
            let comment = backend.service.load(&parse_id(&id)?)?;
            show_comment(&comment, json)
        }
        CommentCommand::Classify { id, verdict } => {
            let comment = backend
                .service
                .classify(&parse_id(&id)?, verdict.into())
                .context("Classification failed")?;
            println!(
                "{} Comment {} is now {}",
                "✓".green(),
                comment.id,
                state_label(comment.state())
            );
            Ok(())
        }
        CommentCommand::Review { id, reject } => {
            let review = backend
                .service
                .review(&parse_id(&id)?, !reject)
                .context("Review failed")?;
            println!(
                "{} Applied {} to {}: now {}",
                "✓".green(),
                review.transition.to_string().cyan(),
                review.comment.id,
                state_label(review.comment.state())
            );
            Ok(())
        }
        CommentCommand::Apply { id, transition } => {
            let comment = backend
                .service
                .apply(&parse_id(&id)?, &transition)
                .with_context(|| format!("Could not apply '{}'", transition))?;
            println!(
                "{} Comment {} is now {}",
                "✓".green(),
                comment.id,
                state_label(comment.state())
            );
            Ok(())
        }
    }
}

fn parse_id(id: &str) -> Result<CommentId> {
    Ok(CommentId::from_string(id)?)
}

fn state_label(state: CommentState) -> colored::ColoredString {
    let label = state.as_str();
    match state {
        CommentState::Published => label.green(),
        CommentState::Rejected | CommentState::Spam => label.red(),
        CommentState::Ham => label.cyan(),
        CommentState::Submitted => label.yellow(),
    }
}

fn list_comments(comments: &[Comment], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    println!("{}", "Comments:".bold().underline());
    println!();
    for comment in comments {
        println!(
            "  {} {:<10} {} <{}>",
            comment.id.to_string().dimmed(),
            state_label(comment.state()),
            comment.author,
            comment.email
        );
    }
    println!();
    println!("Total: {} comment(s)", comments.len());
    Ok(())
}

fn show_comment(comment: &Comment, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(comment)?);
        return Ok(());
    }

    println!("{}", "Comment:".bold().underline());
    println!("  ID:      {}", comment.id);
    println!("  Author:  {} <{}>", comment.author, comment.email);
    println!("  State:   {}", state_label(comment.state()));
    println!(
        "  Created: {}",
        comment.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(photo) = &comment.photo_filename {
        println!("  Photo:   {}", photo);
    }
    println!();
    println!("{}", comment.text);
    println!();

    let enabled = CommentWorkflow::enabled(comment.state());
    if enabled.is_empty() {
        println!("No further transitions.");
    } else {
        let names: Vec<String> = enabled.iter().map(|t| t.to_string()).collect();
        println!("Transitions: {}", names.join(", ").cyan());
    }
    Ok(())
}
