//! Storage traits and abstractions

pub mod memory;

use crate::comment::Comment;
use crate::conference::Conference;
use crate::error::Result;
use crate::types::{CommentId, ConferenceId};
use serde::Serialize;

pub use memory::MemoryStore;

/// One page of published comments for a conference
#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    /// Comments on this page, newest first
    pub comments: Vec<Comment>,
    /// Published comments for the conference across all pages
    pub total: usize,
    /// Offset of the first comment on this page
    pub offset: usize,
    /// Requested page size
    pub page_size: usize,
}

impl CommentPage {
    /// Offset of the previous page; negative when this is the first page
    pub fn previous(&self) -> i64 {
        self.offset as i64 - self.page_size as i64
    }

    /// Offset of the next page; equal to `total` when this is the last page
    pub fn next(&self) -> usize {
        self.total.min(self.offset + self.page_size)
    }

    /// Check if there is a page before this one
    pub fn has_previous(&self) -> bool {
        self.previous() >= 0
    }

    /// Check if there is a page after this one
    pub fn has_next(&self) -> bool {
        self.next() < self.total
    }
}

/// Select one page of published comments, newest first
pub fn paginate<'a>(
    comments: impl IntoIterator<Item = &'a Comment>,
    offset: usize,
    page_size: usize,
) -> CommentPage {
    let mut published: Vec<&Comment> = comments.into_iter().filter(|c| c.is_published()).collect();
    published.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    CommentPage {
        total: published.len(),
        comments: published
            .into_iter()
            .skip(offset)
            .take(page_size)
            .cloned()
            .collect(),
        offset,
        page_size,
    }
}

/// Trait for comment storage implementations
pub trait CommentStore: Send + Sync {
    /// Insert or replace a comment
    fn save(&self, comment: &Comment) -> Result<()>;

    /// Load a comment by ID
    fn load(&self, id: &CommentId) -> Result<Comment>;

    /// Atomically load, modify and save a comment
    ///
    /// No other `update` on the same store observes the comment between the
    /// load and the save. When `f` fails nothing is written.
    fn update(
        &self,
        id: &CommentId,
        f: &mut dyn FnMut(&mut Comment) -> Result<()>,
    ) -> Result<Comment>;

    /// Delete a comment
    fn remove(&self, id: &CommentId) -> Result<()>;

    /// Published comments of a conference, newest first
    fn find_page_for_conference(
        &self,
        conference_id: &ConferenceId,
        offset: usize,
        page_size: usize,
    ) -> Result<CommentPage>;

    /// Every comment of a conference regardless of state, oldest first
    fn list_for_conference(&self, conference_id: &ConferenceId) -> Result<Vec<Comment>>;

    /// Every stored comment, oldest first
    fn list(&self) -> Result<Vec<Comment>>;

    /// Check if a comment exists
    fn exists(&self, id: &CommentId) -> bool {
        self.load(id).is_ok()
    }
}

/// Trait for conference storage implementations
pub trait ConferenceStore: Send + Sync {
    /// Insert or replace a conference
    fn save_conference(&self, conference: &Conference) -> Result<()>;

    /// Find a conference by its slug
    fn find_by_slug(&self, slug: &str) -> Result<Conference>;

    /// All conferences, by year then city
    fn all(&self) -> Result<Vec<Conference>>;

    /// Delete every conference and comment
    fn clear(&self) -> Result<()>;
}
