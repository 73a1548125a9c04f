//! Bounded, age-evicting anchor history store.
//!
//! The history is one postcard-serialized blob under a single storage key.
//! Invariants held after every mutation: records sorted newest first, at
//! most [`CAPACITY_LIMIT`] entries, persisted synchronously. Age-based
//! expiry runs once, at load time; records do not expire mid-session.
//!
//! A corrupt or unreadable blob is never an error: the store starts from an
//! empty collection and the next persist overwrites the bad bytes.

use serde::{Deserialize, Serialize};

use crate::core::{AnchorHistory, AnchorRecord};
use crate::error::Result;

use super::blob::BlobStore;

/// Storage key of the serialized history blob.
pub const STORAGE_KEY: &str = "persistent_geospatial_anchors";

/// Maximum number of anchor records retained.
pub const CAPACITY_LIMIT: usize = 99;

/// Maximum record age survived by a load pass: 24 hours, in microseconds.
pub const MAX_RECORD_AGE_US: u64 = 24 * 60 * 60 * 1_000_000;

/// Magic bytes at the start of the history blob.
const BLOB_MAGIC: [u8; 4] = *b"SANC";

/// Current history blob format version.
const BLOB_VERSION: u16 = 1;

/// On-disk layout of the history blob.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryBlob {
    magic: [u8; 4],
    version: u16,
    history: AnchorHistory,
}

/// Durable anchor record collection over a blob store.
pub struct AnchorHistoryStore<S: BlobStore> {
    blobs: S,
    history: AnchorHistory,
}

impl<S: BlobStore> AnchorHistoryStore<S> {
    /// Load the history from `blobs`, evicting records older than 24 hours.
    ///
    /// An absent, corrupt, or version-mismatched blob yields an empty
    /// collection. If the load pass evicted anything, the pruned set is
    /// persisted immediately.
    pub fn load(blobs: S, now_us: u64) -> Self {
        let history = match blobs.read(STORAGE_KEY) {
            Ok(Some(bytes)) => match postcard::from_bytes::<HistoryBlob>(&bytes) {
                Ok(blob) if blob.magic == BLOB_MAGIC && blob.version == BLOB_VERSION => {
                    blob.history
                }
                Ok(blob) => {
                    log::warn!(
                        "Unsupported history blob (magic {:?}, version {}); starting empty",
                        blob.magic,
                        blob.version
                    );
                    AnchorHistory::default()
                }
                Err(e) => {
                    log::warn!("Corrupt history blob ({}); starting empty", e);
                    AnchorHistory::default()
                }
            },
            Ok(None) => AnchorHistory::default(),
            Err(e) => {
                log::warn!("Failed to read history blob ({}); starting empty", e);
                AnchorHistory::default()
            }
        };

        let mut store = Self { blobs, history };
        let expired = store.history.prune_older_than(now_us, MAX_RECORD_AGE_US);
        if expired > 0 {
            log::info!("Evicted {} expired anchor record(s) on load", expired);
            if let Err(e) = store.persist() {
                log::warn!("Failed to persist pruned history: {}", e);
            }
        }

        log::info!("Loaded {} anchor record(s) from storage", store.len());
        store
    }

    /// Records in on-disk order (newest first).
    pub fn records(&self) -> &[AnchorRecord] {
        &self.history.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Largest record id present, or 0.
    pub fn max_id(&self) -> u64 {
        self.history.max_id().map(|id| id.as_u64()).unwrap_or(0)
    }

    /// Append a record, re-apply the ordering and capacity invariants, and
    /// persist synchronously.
    pub fn append(&mut self, record: AnchorRecord) -> Result<()> {
        self.history.records.push(record);
        self.history.enforce_capacity(CAPACITY_LIMIT);
        self.persist()
    }

    /// Empty the collection and persist synchronously.
    pub fn clear(&mut self) -> Result<()> {
        self.history.records.clear();
        self.persist()
    }

    /// Serialize the full collection and overwrite the durable blob.
    pub fn persist(&mut self) -> Result<()> {
        let blob = HistoryBlob {
            magic: BLOB_MAGIC,
            version: BLOB_VERSION,
            history: self.history.clone(),
        };
        let bytes = postcard::to_allocvec(&blob)?;
        self.blobs.write(STORAGE_KEY, &bytes)
    }

    /// Consume the store, returning the underlying blob store.
    pub fn into_blobs(self) -> S {
        self.blobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AnchorId, AnchorKind, GeoPoint, UnitQuaternion};
    use crate::store::blob::MemoryBlobStore;

    fn record(id: u64, created_at_us: u64) -> AnchorRecord {
        AnchorRecord {
            id: AnchorId::new(id),
            point: GeoPoint::new(49.8097, 8.8905, 0.0),
            eun_rotation: UnitQuaternion::from_yaw_deg(45.0),
            heading_deg: 0.0,
            kind: AnchorKind::Terrain,
            created_at_us,
        }
    }

    #[test]
    fn test_load_absent_blob_is_empty() {
        let store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_append_caps_at_capacity_keeping_newest() {
        let mut store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        for i in 0..100u64 {
            store.append(record(i, i * 1_000_000)).unwrap();
        }

        assert_eq!(store.len(), CAPACITY_LIMIT);
        // Newest first; the oldest record (created_at 0) was evicted.
        assert_eq!(store.records()[0].created_at_us, 99_000_000);
        assert_eq!(store.records()[98].created_at_us, 1_000_000);
    }

    #[test]
    fn test_persist_load_round_trip() {
        let mut store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        for i in 0..5u64 {
            store.append(record(i, i * 1_000_000)).unwrap();
        }
        let expected = store.records().to_vec();

        let reloaded = AnchorHistoryStore::load(store.into_blobs(), 10_000_000);
        assert_eq!(reloaded.records(), expected.as_slice());
    }

    #[test]
    fn test_load_evicts_records_older_than_24_hours() {
        let hour_us: u64 = 60 * 60 * 1_000_000;
        let now_us = 100 * hour_us;

        let mut store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        store.append(record(0, now_us - 25 * hour_us)).unwrap();
        store.append(record(1, now_us - hour_us)).unwrap();

        let reloaded = AnchorHistoryStore::load(store.into_blobs(), now_us);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.records()[0].id, AnchorId::new(1));

        // The pruned set was re-persisted: a second load without further
        // writes sees the same single record.
        let again = AnchorHistoryStore::load(reloaded.into_blobs(), now_us);
        assert_eq!(again.len(), 1);
    }

    #[test]
    fn test_corrupt_blob_starts_empty() {
        let mut blobs = MemoryBlobStore::new();
        blobs.write(STORAGE_KEY, b"not a history blob").unwrap();

        let store = AnchorHistoryStore::load(blobs, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_persists_empty_collection() {
        let mut store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        store.append(record(0, 1)).unwrap();
        store.clear().unwrap();

        let reloaded = AnchorHistoryStore::load(store.into_blobs(), 0);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_max_id_seeds_id_counter() {
        let mut store = AnchorHistoryStore::load(MemoryBlobStore::new(), 0);
        assert_eq!(store.max_id(), 0);
        store.append(record(7, 1)).unwrap();
        store.append(record(3, 2)).unwrap();
        assert_eq!(store.max_id(), 7);
    }
}
