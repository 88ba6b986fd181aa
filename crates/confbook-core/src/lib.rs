//! confbook-core - Core library for confbook
//!
//! This crate provides the domain of the conference guestbook: conferences,
//! visitor comments and the comment review workflow, together with the
//! service that applies workflow transitions and their side effects.

pub mod comment;
pub mod conference;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod messaging;
pub mod notify;
pub mod photo;
pub mod service;
pub mod step_info;
pub mod store;
pub mod types;
pub mod workflow;

pub use error::{ConfbookError, Result};
pub use types::*;
