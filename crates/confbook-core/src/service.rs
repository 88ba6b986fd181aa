//! Comment submission and review service
//!
//! The workflow itself is pure; this service performs the side effects that
//! follow a transition: persisting the new state, queuing moderation
//! messages and notifying the visitor.

use crate::comment::{Comment, CommentBuilder, CommentValidator, NewComment};
use crate::conference::Conference;
use crate::config::CommentsConfig;
use crate::error::{ConfbookError, Result};
use crate::messaging::{Message, MessageDispatcher, RequestContext};
use crate::notify::{Notification, Notifier, SUBMISSION_PROBLEMS, SUBMISSION_THANKS};
use crate::photo::{PhotoStore, PhotoUpload};
use crate::store::{CommentPage, CommentStore};
use crate::types::CommentId;
use crate::workflow::{select_review_transition, CommentTransition, CommentWorkflow, StateMachine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds absolute review links
#[derive(Debug, Clone)]
pub struct ReviewUrls {
    base_url: String,
}

impl ReviewUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Link a moderator opens to review a comment
    pub fn review_url(&self, id: &CommentId) -> String {
        format!("{}/admin/comment/review/{}", self.base_url, id)
    }
}

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub comment: Comment,
    pub notice: Notification,
}

/// Result of a moderator's review
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub transition: CommentTransition,
    pub comment: Comment,
}

/// Outcome of spam classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpamVerdict {
    Ham,
    Spam,
}

impl SpamVerdict {
    fn transition(&self) -> CommentTransition {
        match self {
            SpamVerdict::Ham => CommentTransition::AcceptAsHam,
            SpamVerdict::Spam => CommentTransition::AcceptAsSpam,
        }
    }
}

/// Service coordinating comment persistence, workflow and side effects
pub struct CommentService {
    comments: Arc<dyn CommentStore>,
    dispatcher: Arc<dyn MessageDispatcher>,
    notifier: Arc<dyn Notifier>,
    photos: Arc<dyn PhotoStore>,
    urls: ReviewUrls,
    validator: CommentValidator,
    page_size: usize,
}

impl CommentService {
    /// Create a service with default comment settings
    pub fn new(
        comments: Arc<dyn CommentStore>,
        dispatcher: Arc<dyn MessageDispatcher>,
        notifier: Arc<dyn Notifier>,
        photos: Arc<dyn PhotoStore>,
        urls: ReviewUrls,
    ) -> Self {
        Self::with_config(
            comments,
            dispatcher,
            notifier,
            photos,
            urls,
            &CommentsConfig::default(),
        )
    }

    /// Create a service with explicit comment settings
    pub fn with_config(
        comments: Arc<dyn CommentStore>,
        dispatcher: Arc<dyn MessageDispatcher>,
        notifier: Arc<dyn Notifier>,
        photos: Arc<dyn PhotoStore>,
        urls: ReviewUrls,
        config: &CommentsConfig,
    ) -> Self {
        Self {
            comments,
            dispatcher,
            notifier,
            photos,
            urls,
            validator: CommentValidator::from_config(config),
            page_size: config.page_size.max(1),
        }
    }

    /// Link used in moderation messages
    pub fn review_url(&self, id: &CommentId) -> String {
        self.urls.review_url(id)
    }

    /// Accept a visitor's comment for moderation
    ///
    /// The comment is persisted as `submitted` and exactly one
    /// `ClassifyAndNotify` message is queued. If queuing fails the comment
    /// is removed again so it never sits unmoderated without a message.
    /// A photo stored for a submission that fails afterwards is deleted.
    pub fn submit(
        &self,
        conference: &Conference,
        submission: NewComment,
        photo: Option<PhotoUpload>,
        context: RequestContext,
    ) -> Result<Submission> {
        if let Err(e) = self.validator.validate(&submission) {
            self.notify(&Notification::browser(SUBMISSION_PROBLEMS));
            return Err(e);
        }

        let photo_filename = match photo {
            Some(upload) => Some(self.store_photo(&upload)?),
            None => None,
        };

        let saved =
            self.save_and_enqueue(conference, submission, photo_filename.clone(), context);
        let comment = match saved {
            Ok(comment) => comment,
            Err(e) => {
                if let Some(filename) = photo_filename {
                    self.discard_photo(&filename);
                }
                return Err(e);
            }
        };

        let notice = Notification::browser(SUBMISSION_THANKS);
        self.notify(&notice);

        Ok(Submission { comment, notice })
    }

    /// Apply a moderator's decision to a classified comment
    ///
    /// Decision and write happen in one store update, so a second reviewer
    /// sees the terminal state and gets `AlreadyReviewed`. Accepted reviews
    /// queue exactly one `ReviewApproved` message; rejections queue nothing.
    pub fn review(&self, id: &CommentId, accepted: bool) -> Result<Review> {
        let mut chosen = None;
        let comment = self.comments.update(id, &mut |comment| {
            let transition = select_review_transition(comment.state(), accepted)
                .ok_or_else(|| ConfbookError::AlreadyReviewed(comment.id.to_string()))?;
            CommentWorkflow::apply_transition(comment, transition)?;
            chosen = Some(transition);
            Ok(())
        })?;
        let transition = chosen.ok_or_else(|| ConfbookError::AlreadyReviewed(id.to_string()))?;

        if accepted {
            let message = Message::ReviewApproved {
                comment_id: comment.id,
                review_url: self.urls.review_url(&comment.id),
            };
            self.dispatcher.enqueue(&message).map_err(into_dispatch_error)?;
            info!(comment = %comment.id, "Queued review approval");
        }

        Ok(Review {
            transition,
            comment,
        })
    }

    /// Record the spam classification of a submitted comment
    pub fn classify(&self, id: &CommentId, verdict: SpamVerdict) -> Result<Comment> {
        self.comments.update(id, &mut |comment| {
            CommentWorkflow::apply_transition(comment, verdict.transition()).map(|_| ())
        })
    }

    /// Apply a named transition and persist the result
    pub fn apply(&self, id: &CommentId, transition: &str) -> Result<Comment> {
        self.comments.update(id, &mut |comment| {
            CommentWorkflow::apply(comment, transition).map(|_| ())
        })
    }

    /// Load a comment by ID
    pub fn load(&self, id: &CommentId) -> Result<Comment> {
        self.comments.load(id)
    }

    /// Every comment of a conference regardless of state
    pub fn list_for_conference(&self, conference: &Conference) -> Result<Vec<Comment>> {
        self.comments.list_for_conference(&conference.id)
    }

    /// Published comments of a conference; negative offsets start at 0
    pub fn page(&self, conference: &Conference, offset: i64) -> Result<CommentPage> {
        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        self.comments
            .find_page_for_conference(&conference.id, offset, self.page_size)
    }

    fn save_and_enqueue(
        &self,
        conference: &Conference,
        submission: NewComment,
        photo_filename: Option<String>,
        context: RequestContext,
    ) -> Result<Comment> {
        let comment = CommentBuilder::from_submission(conference.id, submission)
            .photo_filename(photo_filename)
            .build()?;
        self.comments.save(&comment)?;
        debug!("Saved comment {} on {}", comment.id, conference.slug);

        let message = Message::ClassifyAndNotify {
            comment_id: comment.id,
            review_url: self.urls.review_url(&comment.id),
            context,
        };
        if let Err(e) = self.dispatcher.enqueue(&message) {
            if let Err(remove_err) = self.comments.remove(&comment.id) {
                warn!(
                    "Failed to remove comment {} after dispatch failure: {}",
                    comment.id, remove_err
                );
            }
            return Err(into_dispatch_error(e));
        }
        info!(comment = %comment.id, "Queued comment for classification");
        Ok(comment)
    }

    fn discard_photo(&self, filename: &str) {
        if let Err(e) = self.photos.remove(filename) {
            warn!("Failed to remove orphaned photo {}: {}", filename, e);
        }
    }

    fn store_photo(&self, upload: &PhotoUpload) -> Result<String> {
        self.photos.store(upload).map_err(|e| match e {
            ConfbookError::Validation(_) => {
                self.notify(&Notification::browser(SUBMISSION_PROBLEMS));
                e
            }
            ConfbookError::PhotoStorage(_) => e,
            other => ConfbookError::PhotoStorage(other.to_string()),
        })
    }

    fn notify(&self, notification: &Notification) {
        if let Err(e) = self.notifier.send(notification) {
            warn!("Failed to send notification: {}", e);
        }
    }
}

fn into_dispatch_error(e: ConfbookError) -> ConfbookError {
    match e {
        ConfbookError::Dispatch(_) => e,
        other => ConfbookError::Dispatch(other.to_string()),
    }
}
