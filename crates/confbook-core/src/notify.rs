//! User-facing notifications

use crate::error::{ConfbookError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Notice shown after a successful submission
pub const SUBMISSION_THANKS: &str =
    "Thank you for the feedback; your comment will be posted after moderation.";

/// Notice shown after a rejected submission
pub const SUBMISSION_PROBLEMS: &str =
    "Can you check your submission? There are some problems with it.";

/// Delivery channel for a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Browser,
    Email,
    Chat,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Browser => write!(f, "browser"),
            Channel::Email => write!(f, "email"),
            Channel::Chat => write!(f, "chat"),
        }
    }
}

/// A short message for the visitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub channels: Vec<Channel>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            subject: subject.into(),
            channels,
        }
    }

    /// Notification for the visitor's browser only
    pub fn browser(subject: impl Into<String>) -> Self {
        Self::new(subject, vec![Channel::Browser])
    }
}

/// Sends notifications; delivery is best-effort
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<()>;
}

/// Notifier that writes notifications to the log
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        let channels: Vec<String> = notification.channels.iter().map(|c| c.to_string()).collect();
        tracing::info!(channels = %channels.join(","), "{}", notification.subject);
        Ok(())
    }
}

/// Notifier that records notifications in memory
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `send` calls fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications sent so far
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, notification: &Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfbookError::Notification("transport down".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notification.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_notification() {
        let n = Notification::browser(SUBMISSION_THANKS);
        assert_eq!(n.channels, vec![Channel::Browser]);
        assert!(TracingNotifier.send(&n).is_ok());
    }

    #[test]
    fn test_memory_notifier() {
        let notifier = MemoryNotifier::new();
        notifier.send(&Notification::browser("hello")).unwrap();
        notifier.set_failing(true);
        assert!(notifier.send(&Notification::browser("lost")).is_err());
        assert_eq!(notifier.sent().len(), 1);
    }
}
