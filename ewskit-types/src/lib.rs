//! Core identifier types for ewskit.
//!
//! Everything the remote store hands out to identify or version an object
//! is opaque to the client: item ids, change keys, folder ids and sync
//! watermarks are compared and echoed back, never interpreted. This crate
//! wraps each of them in a newtype so they cannot be mixed up at call
//! sites:
//! - [`ItemId`] / [`ChangeKey`]: identity and version token of an entity
//! - [`AttachmentId`]: a file attached to an item
//! - [`FolderRef`]: a concrete folder id or a distinguished folder name
//! - [`Watermark`]: the incremental sync state of one folder

mod ids;

pub use ids::{AttachmentId, ChangeKey, DistinguishedFolder, FolderRef, ItemId, Watermark};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when constructing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("identifier must not be empty")]
    Empty,

    #[error("unknown distinguished folder: {0}")]
    UnknownFolder(String),
}
