//! Asynchronous moderation messages
//!
//! Messages are handed to a [`MessageDispatcher`]; processing happens out of
//! band in an external worker. Dispatch returns once the message is queued.

use crate::error::{ConfbookError, Result};
use crate::types::CommentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// Request metadata forwarded to spam classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Submitter IP address
    pub user_ip: Option<String>,
    /// Submitter user agent
    pub user_agent: Option<String>,
    /// Referer header of the submission
    pub referrer: Option<String>,
    /// Page the comment was posted on
    pub permalink: String,
}

/// A message for the moderation worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A new comment needs spam classification and a moderation request
    ClassifyAndNotify {
        comment_id: CommentId,
        review_url: String,
        context: RequestContext,
    },
    /// A moderator accepted a comment
    ReviewApproved {
        comment_id: CommentId,
        review_url: String,
    },
}

impl Message {
    /// The comment this message is about
    pub fn comment_id(&self) -> CommentId {
        match self {
            Message::ClassifyAndNotify { comment_id, .. } => *comment_id,
            Message::ReviewApproved { comment_id, .. } => *comment_id,
        }
    }

    /// Short kind name, for logs and listings
    pub fn kind(&self) -> &'static str {
        match self {
            Message::ClassifyAndNotify { .. } => "classify_and_notify",
            Message::ReviewApproved { .. } => "review_approved",
        }
    }
}

/// A queued message with delivery metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Unique envelope identifier, for at-least-once deduplication
    pub id: Uuid,
    /// When the message was queued
    pub enqueued_at: DateTime<Utc>,
    /// The message
    pub message: Message,
}

impl Envelope {
    /// Wrap a message for queuing now
    pub fn new(message: Message) -> Self {
        Self {
            id: Uuid::new_v4(),
            enqueued_at: Utc::now(),
            message,
        }
    }
}

/// Hands messages to the outbound queue
pub trait MessageDispatcher: Send + Sync {
    /// Queue a message; returns once the queue has accepted it
    fn enqueue(&self, message: &Message) -> Result<()>;
}

/// Dispatcher that keeps messages in memory
#[derive(Default)]
pub struct MemoryDispatcher {
    envelopes: Mutex<Vec<Envelope>>,
    failing: AtomicBool,
}

impl MemoryDispatcher {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `enqueue` calls fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Messages queued so far, in order
    pub fn messages(&self) -> Vec<Message> {
        self.envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    /// Remove and return every queued envelope
    pub fn drain(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.envelopes.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl MessageDispatcher for MemoryDispatcher {
    fn enqueue(&self, message: &Message) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfbookError::Dispatch("queue unavailable".to_string()));
        }
        self.envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Envelope::new(message.clone()));
        Ok(())
    }
}
