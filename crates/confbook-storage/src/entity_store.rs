//! File system storage for comments and conferences

use crate::files::{ensure_dir, json_paths, read_all, read_record, remove_file, write_record};
use confbook_core::comment::Comment;
use confbook_core::conference::{sort_for_listing, Conference};
use confbook_core::error::{ConfbookError, Result};
use confbook_core::store::{paginate, CommentPage, CommentStore, ConferenceStore};
use confbook_core::types::{CommentId, ConferenceId};
use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Lock file shared by every process using the same data directory
const LOCK_FILE: &str = ".lock";

/// File system based comment and conference storage
///
/// Each entity is one JSON file. Writes hold an exclusive lock on
/// `<base_dir>/.lock` so that a load-modify-save in [`CommentStore::update`]
/// is atomic with respect to every other writer of the directory, including
/// other processes (`confbook serve` next to `confbook comment review`).
pub struct FileSystemStorage {
    /// Base directory
    base_dir: PathBuf,
    /// Comments subdirectory
    comments_dir: PathBuf,
    /// Conferences subdirectory
    conferences_dir: PathBuf,
    /// Serializes writers of this instance before they contend on the file lock
    write_lock: Mutex<()>,
}

impl FileSystemStorage {
    /// Create a new file system storage
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        let storage = Self {
            comments_dir: base_dir.join("comments"),
            conferences_dir: base_dir.join("conferences"),
            base_dir,
            write_lock: Mutex::new(()),
        };

        ensure_dir(&storage.comments_dir)?;
        ensure_dir(&storage.conferences_dir)?;
        Ok(storage)
    }

    /// Create storage in the platform data directory (~/.confbook as fallback)
    pub fn default_location() -> Result<Self> {
        Self::new(default_data_dir())
    }

    /// Get base directory
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get comments directory
    pub fn comments_dir(&self) -> &Path {
        &self.comments_dir
    }

    fn lock_file(&self) -> Result<File> {
        let path = self.base_dir.join(LOCK_FILE);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| {
                ConfbookError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to open lock file {:?}: {}", path, e),
                ))
            })
    }

    /// Run `f` while holding the data directory write lock
    fn exclusive<R>(&self, f: impl FnOnce() -> Result<R>) -> Result<R> {
        let _local = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut lock = RwLock::new(self.lock_file()?);
        let _guard = lock.write()?;
        f()
    }

    fn comment_path(&self, id: &CommentId) -> PathBuf {
        self.comments_dir.join(format!("{}.json", id))
    }

    fn conference_path(&self, id: &ConferenceId) -> PathBuf {
        self.conferences_dir.join(format!("{}.json", id))
    }

    fn read_comment(&self, id: &CommentId) -> Result<Comment> {
        read_record(&self.comment_path(id))?
            .ok_or_else(|| ConfbookError::CommentNotFound(id.to_string()))
    }

    fn all_comments(&self) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = read_all(&self.comments_dir)?
            .into_iter()
            .map(|(_, c)| c)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

/// Platform data directory for confbook
pub fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "confbook", "confbook")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".confbook")
        })
}

impl CommentStore for FileSystemStorage {
    fn save(&self, comment: &Comment) -> Result<()> {
        self.exclusive(|| {
            write_record(&self.comments_dir, &comment.id.to_string(), comment)?;
            Ok(())
        })
    }

    fn load(&self, id: &CommentId) -> Result<Comment> {
        self.read_comment(id)
    }

    fn update(
        &self,
        id: &CommentId,
        f: &mut dyn FnMut(&mut Comment) -> Result<()>,
    ) -> Result<Comment> {
        self.exclusive(|| {
            let mut comment = self.read_comment(id)?;
            f(&mut comment)?;
            write_record(&self.comments_dir, &comment.id.to_string(), &comment)?;
            debug!("Updated comment {} to {}", comment.id, comment.state());
            Ok(comment)
        })
    }

    fn remove(&self, id: &CommentId) -> Result<()> {
        self.exclusive(|| {
            if remove_file(&self.comment_path(id))? {
                Ok(())
            } else {
                Err(ConfbookError::CommentNotFound(id.to_string()))
            }
        })
    }

    fn find_page_for_conference(
        &self,
        conference_id: &ConferenceId,
        offset: usize,
        page_size: usize,
    ) -> Result<CommentPage> {
        let comments = self.all_comments()?;
        Ok(paginate(
            comments
                .iter()
                .filter(|c| c.conference_id() == *conference_id),
            offset,
            page_size,
        ))
    }

    fn list_for_conference(&self, conference_id: &ConferenceId) -> Result<Vec<Comment>> {
        Ok(self
            .all_comments()?
            .into_iter()
            .filter(|c| c.conference_id() == *conference_id)
            .collect())
    }

    fn list(&self) -> Result<Vec<Comment>> {
        self.all_comments()
    }

    fn exists(&self, id: &CommentId) -> bool {
        self.comment_path(id).exists()
    }
}

impl ConferenceStore for FileSystemStorage {
    fn save_conference(&self, conference: &Conference) -> Result<()> {
        self.exclusive(|| {
            write_record(&self.conferences_dir, &conference.id.to_string(), conference)?;
            Ok(())
        })
    }

    fn find_by_slug(&self, slug: &str) -> Result<Conference> {
        self.all()?
            .into_iter()
            .find(|c| c.slug == slug)
            .ok_or_else(|| ConfbookError::ConferenceNotFound(slug.to_string()))
    }

    fn all(&self) -> Result<Vec<Conference>> {
        let mut conferences: Vec<Conference> = read_all(&self.conferences_dir)?
            .into_iter()
            .map(|(_, c)| c)
            .collect();
        sort_for_listing(&mut conferences);
        Ok(conferences)
    }

    fn clear(&self) -> Result<()> {
        self.exclusive(|| {
            // Unreadable and incompatible records go too
            for dir in [&self.comments_dir, &self.conferences_dir] {
                for path in json_paths(dir)? {
                    remove_file(&path)?;
                }
            }
            debug!("Cleared storage at {:?}", self.base_dir);
            Ok(())
        })
    }
}

impl FileSystemStorage {
    /// Path a conference is stored at
    pub fn conference_file(&self, conference: &Conference) -> PathBuf {
        self.conference_path(&conference.id)
    }
}
