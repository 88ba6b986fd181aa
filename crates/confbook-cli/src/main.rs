//! confbook - Conference guestbook CLI
//!
//! Runs the guestbook web server and the moderation tooling around it.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create the configuration and data directories
//! confbook init
//!
//! # Load the demo conferences
//! confbook fixtures --yes
//!
//! # Start the server
//! confbook serve
//!
//! # Moderate
//! confbook comment list
//! confbook comment classify <id> ham
//! confbook comment review <id>
//! ```

mod commands;

fn main() {
    if let Err(err) = commands::run() {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
