//! Comment submission validation

use super::model::NewComment;
use crate::config::CommentsConfig;
use crate::error::{ConfbookError, Result};

/// Maximum comment text length (default)
pub const MAX_TEXT_LENGTH: usize = 2000;

/// Maximum author name length (default)
pub const MAX_AUTHOR_LENGTH: usize = 255;

/// Validator for submitted comments
pub struct CommentValidator {
    max_text_length: usize,
    max_author_length: usize,
}

impl CommentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            max_text_length: MAX_TEXT_LENGTH,
            max_author_length: MAX_AUTHOR_LENGTH,
        }
    }

    /// Create a validator from configuration
    pub fn from_config(config: &CommentsConfig) -> Self {
        Self {
            max_text_length: config.max_text_length,
            max_author_length: config.max_author_length,
        }
    }

    /// Validate a submission, reporting every problem at once
    pub fn validate(&self, submission: &NewComment) -> Result<()> {
        let mut problems = Vec::new();

        let author = submission.author.trim();
        if author.is_empty() {
            problems.push("author cannot be empty".to_string());
        } else if author.chars().count() > self.max_author_length {
            problems.push(format!(
                "author exceeds maximum length of {} characters",
                self.max_author_length
            ));
        }

        if !is_valid_email(submission.email.trim()) {
            problems.push("email is not a valid address".to_string());
        }

        let text = submission.text.trim();
        if text.is_empty() {
            problems.push("text cannot be empty".to_string());
        } else if text.chars().count() > self.max_text_length {
            problems.push(format!(
                "text exceeds maximum length of {} characters",
                self.max_text_length
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfbookError::Validation(problems.join("; ")))
        }
    }
}

impl Default for CommentValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Single `@`, non-empty local part, dotted domain without empty labels
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
