//! Photo uploads on disk

use confbook_core::error::{ConfbookError, Result};
use confbook_core::photo::{PhotoStore, PhotoUpload};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores uploaded photos as files in one directory
pub struct PhotoDirectory {
    dir: PathBuf,
}

impl PhotoDirectory {
    /// Use `dir` for photos; it is created on first store
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a stored photo
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl PhotoStore for PhotoDirectory {
    fn store(&self, upload: &PhotoUpload) -> Result<String> {
        let filename = upload.generate_filename()?;

        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(self.dir.join(&filename), &upload.bytes))
            .map_err(|e| {
                ConfbookError::PhotoStorage(format!(
                    "Failed to write {} to {:?}: {}",
                    filename, self.dir, e
                ))
            })?;

        debug!("Stored photo {} ({} bytes)", filename, upload.bytes.len());
        Ok(filename)
    }

    fn remove(&self, filename: &str) -> Result<()> {
        match fs::remove_file(self.path_of(filename)) {
            Ok(()) => {
                debug!("Removed photo {}", filename);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConfbookError::PhotoStorage(format!(
                "Failed to remove {} from {:?}: {}",
                filename, self.dir, e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png() -> PhotoUpload {
        PhotoUpload {
            original_name: Some("me.png".to_string()),
            content_type: Some("image/png".to_string()),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_store_writes_file() {
        let temp = TempDir::new().unwrap();
        let photos = PhotoDirectory::new(temp.path().join("photos"));

        let filename = photos.store(&png()).unwrap();
        assert!(filename.ends_with(".png"));
        assert_eq!(filename.len(), "0123456789ab.png".len());
        assert_eq!(fs::read(photos.path_of(&filename)).unwrap(), png().bytes);

        photos.remove(&filename).unwrap();
        assert!(!photos.path_of(&filename).exists());
        photos.remove(&filename).unwrap();
    }

    #[test]
    fn test_html_upload_never_reaches_disk() {
        let temp = TempDir::new().unwrap();
        let photos = PhotoDirectory::new(temp.path().join("photos"));
        let upload = PhotoUpload {
            original_name: Some("x.html".to_string()),
            content_type: Some("text/html".to_string()),
            bytes: b"<script>alert(1)</script>".to_vec(),
        };

        assert!(matches!(
            photos.store(&upload),
            Err(ConfbookError::Validation(_))
        ));
        assert!(!photos.dir().exists());
    }

    #[test]
    fn test_unwritable_directory() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();
        let photos = PhotoDirectory::new(blocker.join("photos"));

        assert!(matches!(
            photos.store(&png()),
            Err(ConfbookError::PhotoStorage(_))
        ));
    }

    #[test]
    fn test_unknown_type_is_validation_error() {
        let temp = TempDir::new().unwrap();
        let photos = PhotoDirectory::new(temp.path());
        let upload = PhotoUpload {
            bytes: vec![1, 2, 3],
            ..Default::default()
        };

        assert!(matches!(
            photos.store(&upload),
            Err(ConfbookError::Validation(_))
        ));
    }
}
