//! In-memory storage

use super::{paginate, CommentPage, CommentStore, ConferenceStore};
use crate::comment::Comment;
use crate::conference::{sort_for_listing, Conference};
use crate::error::{ConfbookError, Result};
use crate::types::{CommentId, ConferenceId};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    comments: HashMap<CommentId, Comment>,
    conferences: HashMap<ConferenceId, Conference>,
}

/// In-memory comment and conference storage
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl CommentStore for MemoryStore {
    fn save(&self, comment: &Comment) -> Result<()> {
        self.write().comments.insert(comment.id, comment.clone());
        Ok(())
    }

    fn load(&self, id: &CommentId) -> Result<Comment> {
        self.read()
            .comments
            .get(id)
            .cloned()
            .ok_or_else(|| ConfbookError::CommentNotFound(id.to_string()))
    }

    fn update(
        &self,
        id: &CommentId,
        f: &mut dyn FnMut(&mut Comment) -> Result<()>,
    ) -> Result<Comment> {
        let mut tables = self.write();
        let stored = tables
            .comments
            .get_mut(id)
            .ok_or_else(|| ConfbookError::CommentNotFound(id.to_string()))?;

        let mut working = stored.clone();
        f(&mut working)?;
        *stored = working.clone();
        Ok(working)
    }

    fn remove(&self, id: &CommentId) -> Result<()> {
        self.write()
            .comments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ConfbookError::CommentNotFound(id.to_string()))
    }

    fn find_page_for_conference(
        &self,
        conference_id: &ConferenceId,
        offset: usize,
        page_size: usize,
    ) -> Result<CommentPage> {
        let tables = self.read();
        Ok(paginate(
            tables
                .comments
                .values()
                .filter(|c| c.conference_id() == *conference_id),
            offset,
            page_size,
        ))
    }

    fn list_for_conference(&self, conference_id: &ConferenceId) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .read()
            .comments
            .values()
            .filter(|c| c.conference_id() == *conference_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    fn list(&self) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self.read().comments.values().cloned().collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

impl ConferenceStore for MemoryStore {
    fn save_conference(&self, conference: &Conference) -> Result<()> {
        self.write()
            .conferences
            .insert(conference.id, conference.clone());
        Ok(())
    }

    fn find_by_slug(&self, slug: &str) -> Result<Conference> {
        self.read()
            .conferences
            .values()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or_else(|| ConfbookError::ConferenceNotFound(slug.to_string()))
    }

    fn all(&self) -> Result<Vec<Conference>> {
        let mut conferences: Vec<Conference> =
            self.read().conferences.values().cloned().collect();
        sort_for_listing(&mut conferences);
        Ok(conferences)
    }

    fn clear(&self) -> Result<()> {
        let mut tables = self.write();
        tables.comments.clear();
        tables.conferences.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comment::{CommentBuilder, CommentState};
    use crate::workflow::{CommentWorkflow, StateMachine};
    use std::sync::Arc;

    fn comment_for(conference_id: ConferenceId, text: &str) -> Comment {
        CommentBuilder::new(conference_id)
            .author("Fabien")
            .email("fabien@example.com")
            .text(text)
            .build()
            .unwrap()
    }

    fn published_for(conference_id: ConferenceId, text: &str) -> Comment {
        let mut comment = comment_for(conference_id, text);
        CommentWorkflow::apply(&mut comment, "accept_as_ham").unwrap();
        CommentWorkflow::apply(&mut comment, "publish").unwrap();
        comment
    }

    #[test]
    fn test_save_load() {
        let store = MemoryStore::new();
        let comment = comment_for(ConferenceId::new(), "Hello");
        store.save(&comment).unwrap();

        assert_eq!(store.load(&comment.id).unwrap(), comment);
        assert!(store.exists(&comment.id));
        assert!(store.load(&CommentId::new()).is_err());
    }

    #[test]
    fn test_update_failure_writes_nothing() {
        let store = MemoryStore::new();
        let comment = comment_for(ConferenceId::new(), "Hello");
        store.save(&comment).unwrap();

        let result = store.update(&comment.id, &mut |c| {
            CommentWorkflow::apply(c, "accept_as_ham")?;
            Err(ConfbookError::Validation("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.load(&comment.id).unwrap().state(), CommentState::Submitted);
    }

    #[test]
    fn test_concurrent_updates_serialize() {
        let store = Arc::new(MemoryStore::new());
        let mut comment = comment_for(ConferenceId::new(), "Hello");
        CommentWorkflow::apply(&mut comment, "accept_as_ham").unwrap();
        store.save(&comment).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = comment.id;
                std::thread::spawn(move || {
                    let name = if i % 2 == 0 { "publish" } else { "reject" };
                    store
                        .update(&id, &mut |c| CommentWorkflow::apply(c, name).map(|_| ()))
                        .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert!(store.load(&comment.id).unwrap().state().is_terminal());
    }

    #[test]
    fn test_page_only_published_newest_first() {
        let store = MemoryStore::new();
        let conference_id = ConferenceId::new();

        for i in 0..3 {
            store
                .save(&published_for(conference_id, &format!("published {}", i)))
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        store.save(&comment_for(conference_id, "pending")).unwrap();
        store
            .save(&published_for(ConferenceId::new(), "elsewhere"))
            .unwrap();

        let page = store.find_page_for_conference(&conference_id, 0, 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.comments.len(), 2);
        assert_eq!(page.comments[0].text, "published 2");
        assert_eq!(page.previous(), -2);
        assert_eq!(page.next(), 2);
        assert!(page.has_next());

        let page = store.find_page_for_conference(&conference_id, 2, 2).unwrap();
        assert_eq!(page.comments.len(), 1);
        assert_eq!(page.comments[0].text, "published 0");
        assert_eq!(page.next(), 3);
        assert!(!page.has_next());
        assert!(page.has_previous());

        assert_eq!(store.list_for_conference(&conference_id).unwrap().len(), 4);
    }

    #[test]
    fn test_conferences() {
        let store = MemoryStore::new();
        let paris = Conference::new("Paris", "2023", false).unwrap();
        let amsterdam = Conference::new("Amsterdam", "2022", true).unwrap();
        store.save_conference(&paris).unwrap();
        store.save_conference(&amsterdam).unwrap();

        assert_eq!(store.find_by_slug("paris-2023").unwrap(), paris);
        assert!(matches!(
            store.find_by_slug("berlin-2024"),
            Err(ConfbookError::ConferenceNotFound(_))
        ));
        assert_eq!(store.all().unwrap()[0].slug, "amsterdam-2022");

        store.save(&comment_for(paris.id, "x")).unwrap();
        store.clear().unwrap();
        assert!(store.all().unwrap().is_empty());
        assert!(store.list().unwrap().is_empty());
    }
}
