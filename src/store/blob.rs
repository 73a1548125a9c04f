//! String-keyed byte blob persistence.
//!
//! The anchor history is persisted as a single opaque blob under one storage
//! key. `FileBlobStore` maps keys to files under a base directory and makes
//! every write atomic from the reader's perspective: the bytes go to a
//! temporary file first and are renamed over the target, so either the whole
//! blob updates or the prior blob remains intact.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// String-keyed blob persistence seam.
pub trait BlobStore {
    /// Read the blob stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Atomically replace the blob stored under `key`.
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// Filesystem-backed blob store.
pub struct FileBlobStore {
    base_path: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at `base_path`.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: &Path) -> Result<Self> {
        if !base_path.exists() {
            fs::create_dir_all(base_path)?;
        }
        Ok(Self {
            base_path: base_path.to_path_buf(),
        })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.bin", key))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(key);
        let tmp_path = self.base_path.join(format!("{}.bin.tmp", key));

        fs::write(&tmp_path, bytes)?;
        fs::rename(&tmp_path, &path)?;

        log::debug!("Persisted {} bytes under key '{}'", bytes.len(), key);
        Ok(())
    }
}

/// In-memory blob store for tests and simulation.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
