//! Photo attachments

use crate::error::{ConfbookError, Result};
use mime_guess::{mime, Mime};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// An uploaded photo, before storage
#[derive(Debug, Clone, Default)]
pub struct PhotoUpload {
    /// Client-side filename
    pub original_name: Option<String>,
    /// Declared content type
    pub content_type: Option<String>,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Raster image types only; SVG can carry script
fn is_photo(mime: &Mime) -> bool {
    mime.type_() == mime::IMAGE && mime.subtype() != mime::SVG
}

/// Extension for an image type, `jpg` preferred for JPEG
fn image_extension(mime: &Mime) -> Option<String> {
    if !is_photo(mime) {
        return None;
    }
    let known = mime_guess::get_mime_extensions(mime)?;
    ["jpg", mime.subtype().as_str()]
        .into_iter()
        .find(|ext| known.iter().any(|k| k == ext))
        .or_else(|| known.first().copied())
        .map(String::from)
}

impl PhotoUpload {
    /// Guess the file extension from the content type, then the filename
    ///
    /// Only image types are accepted: `x.html` sent as `text/html` has no
    /// extension.
    pub fn extension(&self) -> Option<String> {
        let from_type = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.parse::<Mime>().ok())
            .and_then(|mime| image_extension(&mime));
        if from_type.is_some() {
            return from_type;
        }

        let name = self.original_name.as_deref()?;
        let ext = Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))?;
        mime_guess::from_ext(ext)
            .iter()
            .any(|mime| is_photo(&mime))
            .then(|| ext.to_ascii_lowercase())
    }

    /// A fresh random filename: 12 hex chars plus the guessed extension
    pub fn generate_filename(&self) -> Result<String> {
        let ext = self.extension().ok_or_else(|| {
            ConfbookError::Validation("Photo type could not be determined".to_string())
        })?;
        let random = Uuid::new_v4();
        let stem: String = random.as_bytes()[..6]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Ok(format!("{}.{}", stem, ext))
    }
}

/// Stores uploaded photos and names them
pub trait PhotoStore: Send + Sync {
    /// Store the upload, returning its filename
    fn store(&self, upload: &PhotoUpload) -> Result<String>;

    /// Delete a stored photo; unknown filenames are not an error
    fn remove(&self, filename: &str) -> Result<()>;
}

/// Photo store that keeps files in memory
#[derive(Default)]
pub struct MemoryPhotoStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing: AtomicBool,
}

impl MemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `store` calls fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stored filenames
    pub fn filenames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl PhotoStore for MemoryPhotoStore {
    fn store(&self, upload: &PhotoUpload) -> Result<String> {
        let filename = upload.generate_filename()?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfbookError::PhotoStorage("disk full".to_string()));
        }
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(filename.clone(), upload.bytes.clone());
        Ok(filename)
    }

    fn remove(&self, filename: &str) -> Result<()> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(filename);
        Ok(())
    }
}
