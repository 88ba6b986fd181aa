//! Comment review workflow

use super::{sealed, Edge, StateMachine, Workflowable};
use crate::comment::{Comment, CommentState};
use crate::error::ConfbookError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Edges of the comment review graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentTransition {
    AcceptAsHam,
    AcceptAsSpam,
    Publish,
    Reject,
    PublishHam,
    RejectHam,
}

impl CommentTransition {
    pub const ALL: [CommentTransition; 6] = [
        CommentTransition::AcceptAsHam,
        CommentTransition::AcceptAsSpam,
        CommentTransition::Publish,
        CommentTransition::Reject,
        CommentTransition::PublishHam,
        CommentTransition::RejectHam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommentTransition::AcceptAsHam => "accept_as_ham",
            CommentTransition::AcceptAsSpam => "accept_as_spam",
            CommentTransition::Publish => "publish",
            CommentTransition::Reject => "reject",
            CommentTransition::PublishHam => "publish_ham",
            CommentTransition::RejectHam => "reject_ham",
        }
    }

    /// Check if this transition ends in publication
    pub fn publishes(&self) -> bool {
        matches!(self, CommentTransition::Publish | CommentTransition::PublishHam)
    }
}

impl fmt::Display for CommentTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentTransition {
    type Err = ConfbookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommentTransition::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfbookError::UnknownTransition(s.to_string()))
    }
}

const EDGES: &[Edge<CommentState, CommentTransition>] = &[
    Edge {
        transition: CommentTransition::AcceptAsHam,
        from: CommentState::Submitted,
        to: CommentState::Ham,
    },
    Edge {
        transition: CommentTransition::AcceptAsSpam,
        from: CommentState::Submitted,
        to: CommentState::Spam,
    },
    Edge {
        transition: CommentTransition::Publish,
        from: CommentState::Ham,
        to: CommentState::Published,
    },
    Edge {
        transition: CommentTransition::Reject,
        from: CommentState::Ham,
        to: CommentState::Rejected,
    },
    Edge {
        transition: CommentTransition::PublishHam,
        from: CommentState::Spam,
        to: CommentState::Published,
    },
    Edge {
        transition: CommentTransition::RejectHam,
        from: CommentState::Spam,
        to: CommentState::Rejected,
    },
];

/// State machine governing a comment's moderation
pub struct CommentWorkflow;

impl StateMachine for CommentWorkflow {
    type State = CommentState;
    type Transition = CommentTransition;

    const NAME: &'static str = "comment";

    fn initial() -> CommentState {
        CommentState::Submitted
    }

    fn edges() -> &'static [Edge<CommentState, CommentTransition>] {
        EDGES
    }
}

impl Workflowable for Comment {
    type Machine = CommentWorkflow;

    fn marking(&self) -> CommentState {
        self.state()
    }

    fn set_marking(&mut self, state: CommentState, _token: sealed::Token) {
        self.set_state(state);
    }
}

/// Pick the transition for a moderator's decision
///
/// The ham branch is checked first, then the spam branch. `None` means the
/// comment was already reviewed or is not yet classified.
pub fn select_review_transition(state: CommentState, accepted: bool) -> Option<CommentTransition> {
    let (accept, reject) = if CommentWorkflow::next(state, CommentTransition::Publish).is_some() {
        (CommentTransition::Publish, CommentTransition::Reject)
    } else if CommentWorkflow::next(state, CommentTransition::PublishHam).is_some() {
        (CommentTransition::PublishHam, CommentTransition::RejectHam)
    } else {
        return None;
    };

    Some(if accepted { accept } else { reject })
}
