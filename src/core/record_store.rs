/*
 * Holds the latest full batch of `ApplicationRecord`s. The batch is an immutable
 * snapshot behind an `Arc`; replacing it swaps the pointer under a write lock, so
 * readers either see the old batch or the new one and never a mix of both.
 *
 * Refreshes take a `RefreshToken` before they start enumerating. Publishing with a
 * token that is no longer the most recently issued one is refused, so a slow,
 * superseded refresh cannot overwrite the result of a newer request.
 */
use super::models::ApplicationRecord;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/* Generation tag handed to a refresh when it starts. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshToken(pub u64);

pub struct RecordStore {
    current: RwLock<Arc<[ApplicationRecord]>>,
    latest_issued: AtomicU64,
}

impl RecordStore {
    pub fn new() -> Self {
        log::debug!("RecordStore::new called - starting with an empty batch.");
        RecordStore {
            current: RwLock::new(Arc::from(Vec::new())),
            latest_issued: AtomicU64::new(0),
        }
    }

    /*
     * Returns a handle to the current batch in enumeration order. The handle stays
     * valid (and unchanged) even if the store is replaced afterwards.
     */
    pub fn all(&self) -> Arc<[ApplicationRecord]> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /*
     * Swaps in a whole new batch unconditionally. There is no partial update: the
     * previous batch is dropped once the last reader lets go of it.
     */
    pub fn replace_all(&self, records: Vec<ApplicationRecord>) {
        let count = records.len();
        let snapshot: Arc<[ApplicationRecord]> = Arc::from(records);
        match self.current.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        log::debug!("RecordStore: Replaced batch, now holding {count} records.");
    }

    /* Issues the next refresh generation. */
    pub fn begin_refresh(&self) -> RefreshToken {
        let generation = self.latest_issued.fetch_add(1, Ordering::SeqCst) + 1;
        log::trace!("RecordStore: Issued refresh generation {generation}.");
        RefreshToken(generation)
    }

    pub fn is_latest(&self, token: RefreshToken) -> bool {
        self.latest_issued.load(Ordering::SeqCst) == token.0
    }

    /*
     * Replaces the batch if `token` is still the newest generation issued.
     * Returns `false`, leaving the store untouched, for a stale token.
     */
    pub fn publish(&self, token: RefreshToken, records: Vec<ApplicationRecord>) -> bool {
        let count = records.len();
        let snapshot: Arc<[ApplicationRecord]> = Arc::from(records);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Checked under the write lock so two publishers cannot interleave.
        if !self.is_latest(token) {
            log::debug!(
                "RecordStore: Dropping stale batch of {count} records from generation {} (latest is {}).",
                token.0,
                self.latest_issued.load(Ordering::SeqCst)
            );
            return false;
        }
        *guard = snapshot;
        log::debug!(
            "RecordStore: Published generation {} with {count} records.",
            token.0
        );
        true
    }

    pub fn find(&self, package_id: &str) -> Option<ApplicationRecord> {
        self.all()
            .iter()
            .find(|record| record.package_id() == package_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.all().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
