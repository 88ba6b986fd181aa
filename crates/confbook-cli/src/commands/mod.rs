//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod comment;
pub mod config;
pub mod fixtures;
pub mod init;
pub mod outbox;
pub mod serve;
pub mod step_info;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use confbook_core::config::{Config, DEFAULT_CONFIG_PATH};
use confbook_core::notify::TracingNotifier;
use confbook_core::service::{CommentService, ReviewUrls};
use confbook_storage::{FileSystemStorage, Outbox, PhotoDirectory};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// confbook - Conference guestbook with comment moderation
#[derive(Debug, Parser)]
#[command(name = "confbook")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CONFBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the configuration file and data directories
    Init(init::InitArgs),

    /// Run the web server
    Serve(serve::ServeArgs),

    /// Load the demo conferences and comment
    Fixtures(fixtures::FixturesArgs),

    /// Inspect and moderate comments
    #[command(subcommand)]
    Comment(comment::CommentCommand),

    /// Inspect queued moderation messages
    #[command(subcommand)]
    Outbox(outbox::OutboxCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),

    /// Print the git tags pointing at HEAD (cached)
    StepInfo(step_info::StepInfoArgs),
}

/// Resolved configuration shared by the commands
pub struct CliContext {
    pub config_path: PathBuf,
    pub config: Config,
}

impl CliContext {
    fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
        let config = Config::load_or_default(&config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?;
        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.storage.data_dir
    }

    pub fn outbox_dir(&self) -> PathBuf {
        self.data_dir().join("outbox")
    }

    /// Open the file system backend described by the configuration
    pub fn backend(&self) -> Result<Backend> {
        let storage = Arc::new(
            FileSystemStorage::new(self.data_dir())
                .with_context(|| format!("Failed to open storage at {}", self.data_dir().display()))?,
        );
        let outbox = Arc::new(Outbox::new(self.outbox_dir()).context("Failed to open outbox")?);
        let service = CommentService::with_config(
            storage.clone(),
            outbox.clone(),
            Arc::new(TracingNotifier),
            Arc::new(PhotoDirectory::new(self.config.photo_dir())),
            ReviewUrls::new(self.config.server.base_url.clone()),
            &self.config.comments,
        );

        Ok(Backend {
            storage,
            outbox,
            service: Arc::new(service),
        })
    }
}

/// File system collaborators wired into the comment service
pub struct Backend {
    pub storage: Arc<FileSystemStorage>,
    pub outbox: Arc<Outbox>,
    pub service: Arc<CommentService>,
}

/// Run the CLI application
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = CliContext::load(cli.config)?;

    match cli.command {
        Commands::Init(args) => init::execute(args, &ctx),
        Commands::Serve(args) => serve::execute(args, &ctx),
        Commands::Fixtures(args) => fixtures::execute(args, &ctx),
        Commands::Comment(cmd) => comment::execute(cmd, &ctx),
        Commands::Outbox(cmd) => outbox::execute(cmd, &ctx),
        Commands::Config(cmd) => config::execute(cmd, &ctx),
        Commands::StepInfo(args) => step_info::execute(args, &ctx),
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_review_args() {
        let cli = Cli::parse_from(["confbook", "comment", "review", "abc", "--reject"]);
        match cli.command {
            Commands::Comment(comment::CommentCommand::Review { id, reject }) => {
                assert_eq!(id, "abc");
                assert!(reject);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp = tempfile::TempDir::new().unwrap();
        let ctx = CliContext::load(Some(temp.path().join("none.toml"))).unwrap();
        assert_eq!(ctx.config.comments.page_size, 2);
        assert!(ctx.outbox_dir().ends_with("outbox"));
    }
}
