//! File-backed message outbox

use crate::files::{ensure_dir, read_all, remove_file, write_record};
use confbook_core::error::{ConfbookError, Result};
use confbook_core::messaging::{Envelope, Message, MessageDispatcher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Message queue kept as one JSON file per envelope
///
/// File names start with the enqueue timestamp, so directory order is
/// delivery order. A worker reads the queue with [`Outbox::list`] and takes
/// ownership of messages with [`Outbox::drain`].
pub struct Outbox {
    dir: PathBuf,
    lock: Mutex<()>,
    /// Tie-breaker for envelopes queued within the same microsecond
    seq: AtomicU64,
}

impl Outbox {
    /// Open (and create if needed) an outbox directory
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            seq: AtomicU64::new(0),
        })
    }

    /// Outbox directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queued envelopes, oldest first
    pub fn list(&self) -> Result<Vec<Envelope>> {
        Ok(read_all::<Envelope>(&self.dir)?
            .into_iter()
            .map(|(_, envelope)| envelope)
            .collect())
    }

    /// Remove and return every queued envelope, oldest first
    ///
    /// An envelope whose file cannot be removed stays queued and is not
    /// returned; it is picked up by the next drain.
    pub fn drain(&self) -> Result<Vec<Envelope>> {
        let _guard = self.lock();
        let drained = take(read_all::<Envelope>(&self.dir)?, remove_file);
        if !drained.is_empty() {
            info!("Drained {} message(s) from outbox", drained.len());
        }
        Ok(drained)
    }

    /// Number of queued envelopes
    pub fn len(&self) -> Result<usize> {
        Ok(self.list()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Hand over each envelope whose file `remove` deleted
fn take(
    queued: Vec<(PathBuf, Envelope)>,
    mut remove: impl FnMut(&Path) -> Result<bool>,
) -> Vec<Envelope> {
    let mut taken = Vec::with_capacity(queued.len());
    for (path, envelope) in queued {
        match remove(&path) {
            Ok(true) => taken.push(envelope),
            // Another drain got there first
            Ok(false) => {}
            Err(e) => warn!("Leaving {:?} queued, removal failed: {}", path, e),
        }
    }
    taken
}

fn file_name(envelope: &Envelope, seq: u64) -> String {
    format!(
        "{}-{:06}-{}",
        envelope.enqueued_at.format("%Y%m%d%H%M%S%6f"),
        seq % 1_000_000,
        envelope.id
    )
}

impl MessageDispatcher for Outbox {
    fn enqueue(&self, message: &Message) -> Result<()> {
        let _guard = self.lock();
        let envelope = Envelope::new(message.clone());
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        write_record(&self.dir, &file_name(&envelope, seq), &envelope)
            .map_err(|e| ConfbookError::Dispatch(e.to_string()))?;
        debug!(
            "Queued {} for comment {}",
            message.kind(),
            message.comment_id()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confbook_core::messaging::RequestContext;
    use confbook_core::types::CommentId;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn classify(id: CommentId) -> Message {
        Message::ClassifyAndNotify {
            comment_id: id,
            review_url: format!("http://localhost/admin/comment/review/{}", id),
            context: RequestContext {
                permalink: "http://localhost/en/conference/amsterdam-2022".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_enqueue_and_list_in_order() {
        let temp = TempDir::new().unwrap();
        let outbox = Outbox::new(temp.path().join("outbox")).unwrap();
        assert!(outbox.is_empty().unwrap());

        let first = CommentId::new();
        let second = CommentId::new();
        outbox.enqueue(&classify(first)).unwrap();
        outbox
            .enqueue(&Message::ReviewApproved {
                comment_id: second,
                review_url: "http://localhost/admin/comment/review/x".to_string(),
            })
            .unwrap();

        let ids: Vec<_> = outbox
            .list()
            .unwrap()
            .iter()
            .map(|e| e.message.comment_id())
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn test_drain_empties_queue() {
        let temp = TempDir::new().unwrap();
        let outbox = Outbox::new(temp.path()).unwrap();
        outbox.enqueue(&classify(CommentId::new())).unwrap();

        let drained = outbox.drain().unwrap();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].message.kind(), "classify_and_notify");
        assert!(outbox.is_empty().unwrap());
        assert!(outbox.drain().unwrap().is_empty());
    }

    #[test]
    fn test_failed_removal_keeps_envelope_queued() {
        let temp = TempDir::new().unwrap();
        let outbox = Outbox::new(temp.path()).unwrap();
        let ids: Vec<_> = (0..3).map(|_| CommentId::new()).collect();
        for id in &ids {
            outbox.enqueue(&classify(*id)).unwrap();
        }
        let queued = read_all::<Envelope>(outbox.dir()).unwrap();
        let stuck = queued[1].0.clone();

        let taken = take(queued, |path| {
            if path == stuck {
                Err(ConfbookError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )))
            } else {
                remove_file(path)
            }
        });

        let taken: Vec<_> = taken.iter().map(|e| e.message.comment_id()).collect();
        assert_eq!(taken, vec![ids[0], ids[2]]);
        let left: Vec<_> = outbox
            .list()
            .unwrap()
            .iter()
            .map(|e| e.message.comment_id())
            .collect();
        assert_eq!(left, vec![ids[1]]);
        assert_eq!(outbox.drain().unwrap().len(), 1);
    }

    #[test]
    fn test_drain_skips_envelopes_already_taken() {
        let temp = TempDir::new().unwrap();
        let outbox = Outbox::new(temp.path()).unwrap();
        outbox.enqueue(&classify(CommentId::new())).unwrap();
        let queued = read_all::<Envelope>(outbox.dir()).unwrap();
        std::fs::remove_file(&queued[0].0).unwrap();

        assert!(take(queued, remove_file).is_empty());
    }

    #[test]
    fn test_unwritable_outbox_is_dispatch_error() {
        let temp = TempDir::new().unwrap();
        let outbox = Outbox::new(temp.path().join("outbox")).unwrap();
        std::fs::remove_dir_all(outbox.dir()).unwrap();

        assert!(matches!(
            outbox.enqueue(&classify(CommentId::new())),
            Err(ConfbookError::Dispatch(_))
        ));
    }
}
