//! confbook-storage - File system persistence for confbook
//!
//! Comments, conferences and queued messages are kept as versioned JSON
//! records; uploaded photos are written as plain files.

mod files;

pub mod entity_store;
pub mod outbox;
pub mod photo_dir;

pub use entity_store::{default_data_dir, FileSystemStorage};
pub use files::CURRENT_SCHEMA_VERSION;
pub use outbox::Outbox;
pub use photo_dir::PhotoDirectory;
