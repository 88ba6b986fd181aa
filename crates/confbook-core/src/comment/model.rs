//! Comment data models

use crate::error::ConfbookError;
use crate::types::{CommentId, ConferenceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A visitor comment on a conference
///
/// `state` is owned by the comment workflow: it can be read by anyone but is
/// only written through [`crate::workflow::StateMachine::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment identifier
    pub id: CommentId,
    /// Owning conference, fixed at creation
    conference_id: ConferenceId,
    /// Author display name
    pub author: String,
    /// Author email
    pub email: String,
    /// Comment body
    pub text: String,
    /// Stored photo, if one was attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_filename: Option<String>,
    /// Moderation state
    state: CommentState,
    /// When the comment was created
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub(crate) fn new(
        conference_id: ConferenceId,
        author: String,
        email: String,
        text: String,
        photo_filename: Option<String>,
    ) -> Self {
        Self {
            id: CommentId::new(),
            conference_id,
            author,
            email,
            text,
            photo_filename,
            state: CommentState::Submitted,
            created_at: Utc::now(),
        }
    }

    /// Owning conference
    pub fn conference_id(&self) -> ConferenceId {
        self.conference_id
    }

    /// Current moderation state
    pub fn state(&self) -> CommentState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: CommentState) {
        self.state = state;
    }

    /// Whether the comment is visible on the conference page
    pub fn is_published(&self) -> bool {
        self.state == CommentState::Published
    }
}

/// Comment moderation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentState {
    /// Newly submitted, awaiting spam classification
    #[default]
    Submitted,
    /// Classified as spam, awaiting human confirmation
    Spam,
    /// Classified as legitimate, awaiting human review
    Ham,
    /// Visible on the site
    Published,
    /// Refused by a moderator
    Rejected,
}

impl CommentState {
    /// All states, in workflow order
    pub const ALL: [CommentState; 5] = [
        CommentState::Submitted,
        CommentState::Spam,
        CommentState::Ham,
        CommentState::Published,
        CommentState::Rejected,
    ];

    /// Check if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommentState::Published | CommentState::Rejected)
    }

    /// Check if the comment is waiting on a human moderator
    pub fn awaits_review(&self) -> bool {
        matches!(self, CommentState::Ham | CommentState::Spam)
    }

    /// Stable name used in URLs, storage and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentState::Submitted => "submitted",
            CommentState::Spam => "spam",
            CommentState::Ham => "ham",
            CommentState::Published => "published",
            CommentState::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CommentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentState {
    type Err = ConfbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| ConfbookError::Validation(format!("Unknown comment state: {}", s)))
    }
}

/// Submitted form content for a new comment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComment {
    pub author: String,
    pub email: String,
    pub text: String,
}
