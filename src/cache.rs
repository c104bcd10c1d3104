// ⏱️ Dataset Cache - Bounded-staleness snapshot of the persisted dataset
//
// Decompressing the blob on every read is wasteful; holding it forever means
// never seeing a new ingestion. The cache re-reads the store once the TTL
// lapses, so readers observe staleness of at most one window. Invalidation
// is time-based only, never push-based.
//
// The clock is injected so tests control time instead of sleeping.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::codec::decode_dataset;
use crate::entity::Entity;
use crate::store::{BlobStore, DATASET_KEY};

/// How long a decoded snapshot stays fresh
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

// ============================================================================
// CLOCK
// ============================================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real monotonic clock
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// ============================================================================
// SNAPSHOT
// ============================================================================

/// One immutable decoded dataset, indexed for uid lookup
pub struct DatasetSnapshot {
    entities: Vec<Entity>,
    by_uid: HashMap<String, usize>,
}

impl DatasetSnapshot {
    pub fn new(entities: Vec<Entity>) -> Self {
        let mut by_uid = HashMap::with_capacity(entities.len());
        for (idx, entity) in entities.iter().enumerate() {
            // Duplicate uids: last one wins, matching join resolution
            by_uid.insert(entity.uid.clone(), idx);
        }
        DatasetSnapshot { entities, by_uid }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Exact uid lookup
    pub fn find(&self, uid: &str) -> Option<&Entity> {
        self.by_uid.get(uid).map(|&idx| &self.entities[idx])
    }
}

// ============================================================================
// CACHE
// ============================================================================

struct CachedSlot {
    snapshot: Arc<DatasetSnapshot>,
    loaded_at: Instant,
}

/// TTL-bounded snapshot cache over the blob store
pub struct DatasetCache {
    store: Arc<dyn BlobStore>,
    clock: Box<dyn Clock>,
    ttl: Duration,
    slot: Mutex<Option<CachedSlot>>,
}

impl DatasetCache {
    pub fn new(store: Arc<dyn BlobStore>, ttl: Duration) -> Self {
        Self::with_clock(store, ttl, Box::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn BlobStore>, ttl: Duration, clock: Box<dyn Clock>) -> Self {
        DatasetCache {
            store,
            clock,
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Current dataset snapshot, decoded at most once per TTL window
    ///
    /// Ok(None) means no ingestion run has ever persisted a dataset.
    pub fn snapshot(&self) -> Result<Option<Arc<DatasetSnapshot>>> {
        let mut slot = self.slot.lock().unwrap();

        if let Some(cached) = slot.as_ref() {
            if self.clock.now().duration_since(cached.loaded_at) < self.ttl {
                return Ok(Some(Arc::clone(&cached.snapshot)));
            }
        }

        let bytes = match self.store.get(DATASET_KEY)? {
            Some(bytes) => bytes,
            None => {
                *slot = None;
                return Ok(None);
            }
        };

        let snapshot = Arc::new(DatasetSnapshot::new(decode_dataset(&bytes)?));
        *slot = Some(CachedSlot {
            snapshot: Arc::clone(&snapshot),
            loaded_at: self.clock.now(),
        });

        Ok(Some(snapshot))
    }

    /// Drop the cached snapshot; the next read hits the store
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

// ============================================================================
// TESTS
// ============================================================================
