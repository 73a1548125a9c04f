//! Durable anchor history storage.
//!
//! This module provides:
//! - `BlobStore`: string-keyed byte blob persistence seam
//! - `AnchorHistoryStore`: bounded, age-evicting anchor record store

pub mod blob;
pub mod history;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use history::{AnchorHistoryStore, CAPACITY_LIMIT, MAX_RECORD_AGE_US, STORAGE_KEY};
