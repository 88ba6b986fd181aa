//! Comment builder for fluent API

use super::model::{Comment, NewComment};
use crate::error::{ConfbookError, Result};
use crate::types::ConferenceId;

/// Builder for creating comments in the `submitted` state
pub struct CommentBuilder {
    conference_id: ConferenceId,
    author: Option<String>,
    email: Option<String>,
    text: Option<String>,
    photo_filename: Option<String>,
}

impl CommentBuilder {
    /// Create a new builder for a comment on the given conference
    pub fn new(conference_id: ConferenceId) -> Self {
        Self {
            conference_id,
            author: None,
            email: None,
            text: None,
            photo_filename: None,
        }
    }

    /// Start from submitted form content
    pub fn from_submission(conference_id: ConferenceId, submission: NewComment) -> Self {
        Self::new(conference_id)
            .author(submission.author)
            .email(submission.email)
            .text(submission.text)
    }

    /// Set the author name
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the author email
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the comment body
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach a stored photo
    pub fn photo_filename(mut self, filename: Option<String>) -> Self {
        self.photo_filename = filename;
        self
    }

    /// Build the comment
    pub fn build(self) -> Result<Comment> {
        let author = required("author", self.author)?;
        let email = required("email", self.email)?;
        let text = required("text", self.text)?;

        Ok(Comment::new(
            self.conference_id,
            author.trim().to_string(),
            email.trim().to_string(),
            text,
            self.photo_filename,
        ))
    }
}

fn required(field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfbookError::Validation(format!(
            "Comment {} is required",
            field
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::CommentState;

    #[test]
    fn test_basic_builder() {
        let conference_id = ConferenceId::new();
        let comment = CommentBuilder::new(conference_id)
            .author("  Fabien ")
            .email("fabien@example.com")
            .text("Great talk")
            .build()
            .unwrap();

        assert_eq!(comment.author, "Fabien");
        assert_eq!(comment.conference_id(), conference_id);
        assert_eq!(comment.state(), CommentState::Submitted);
    }

    #[test]
    fn test_builder_with_photo() {
        let comment = CommentBuilder::new(ConferenceId::new())
            .author("Lucas")
            .email("lucas@example.com")
            .text("Nice venue")
            .photo_filename(Some("0a1b2c3d4e5f.png".to_string()))
            .build()
            .unwrap();

        assert_eq!(comment.photo_filename.as_deref(), Some("0a1b2c3d4e5f.png"));
    }

    #[test]
    fn test_builder_requires_fields() {
        let result = CommentBuilder::new(ConferenceId::new())
            .author("Fabien")
            .text("Missing email")
            .build();
        assert!(matches!(result, Err(ConfbookError::Validation(_))));

        let result = CommentBuilder::new(ConferenceId::new())
            .author("Fabien")
            .email("fabien@example.com")
            .text("   ")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_submission() {
        let submission = NewComment {
            author: "Helene".to_string(),
            email: "helene@example.com".to_string(),
            text: "Merci".to_string(),
        };
        let comment = CommentBuilder::from_submission(ConferenceId::new(), submission)
            .build()
            .unwrap();
        assert_eq!(comment.text, "Merci");
    }
}
