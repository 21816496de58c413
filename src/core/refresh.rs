/*
 * Runs package enumeration off the caller's thread and publishes the result into
 * the `RecordStore`. Each refresh takes a generation token before it starts, and
 * its batch is only published if no newer refresh was requested in the meantime.
 * Completion is reported as a `RefreshEvent` on an mpsc channel so a UI loop can
 * poll for it without blocking.
 *
 * A failed enumeration never touches the store: the previous batch stays visible.
 */
use super::package_source::{
    CatalogError, FootprintPolicy, PackageEnumeratorOperations, build_records,
};
use super::record_store::{RecordStore, RefreshToken};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};
use std::thread;

/* What happened to one refresh request. */
#[derive(Debug)]
pub enum RefreshEvent {
    Published { generation: u64, record_count: usize },
    Superseded { generation: u64 },
    Failed { generation: u64, error: CatalogError },
}

pub struct RefreshCoordinator {
    store: Arc<RecordStore>,
    enumerator: Arc<dyn PackageEnumeratorOperations>,
    footprint_policy: FootprintPolicy,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<RecordStore>,
        enumerator: Arc<dyn PackageEnumeratorOperations>,
        footprint_policy: FootprintPolicy,
    ) -> Self {
        RefreshCoordinator {
            store,
            enumerator,
            footprint_policy,
        }
    }

    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    fn run(
        store: &RecordStore,
        enumerator: &dyn PackageEnumeratorOperations,
        footprint_policy: FootprintPolicy,
        token: RefreshToken,
    ) -> RefreshEvent {
        let generation = token.0;
        log::debug!("RefreshCoordinator: Generation {generation} enumerating packages.");

        let descriptors = match enumerator.list_installed() {
            Ok(descriptors) => descriptors,
            Err(error) => {
                log::error!(
                    "RefreshCoordinator: Generation {generation} failed, keeping previous batch: {error}"
                );
                return RefreshEvent::Failed { generation, error };
            }
        };

        if !store.is_latest(token) {
            // Skip the mapping work, nothing would be published anyway.
            log::debug!("RefreshCoordinator: Generation {generation} superseded before mapping.");
            return RefreshEvent::Superseded { generation };
        }

        let records = build_records(&descriptors, footprint_policy);
        let record_count = records.len();
        if store.publish(token, records) {
            log::info!(
                "RefreshCoordinator: Generation {generation} published {record_count} records."
            );
            RefreshEvent::Published {
                generation,
                record_count,
            }
        } else {
            RefreshEvent::Superseded { generation }
        }
    }

    /*
     * Performs a refresh on the calling thread. Intended for headless tools and
     * tests; interactive callers should use `request_refresh`.
     */
    pub fn refresh_blocking(&self) -> RefreshEvent {
        let token = self.store.begin_refresh();
        Self::run(
            &self.store,
            self.enumerator.as_ref(),
            self.footprint_policy,
            token,
        )
    }

    /*
     * Starts a refresh on a worker thread and returns the channel on which its
     * single `RefreshEvent` will arrive. The generation is taken here, on the
     * calling thread, so request order decides which result wins.
     */
    pub fn request_refresh(&self) -> Receiver<RefreshEvent> {
        let token = self.store.begin_refresh();
        let (sender, receiver) = mpsc::channel();
        let store = Arc::clone(&self.store);
        let enumerator = Arc::clone(&self.enumerator);
        let footprint_policy = self.footprint_policy;

        let spawn_result = thread::Builder::new()
            .name(format!("refresh-{}", token.0))
            .spawn(move || {
                let event = Self::run(&store, enumerator.as_ref(), footprint_policy, token);
                if sender.send(event).is_err() {
                    log::debug!(
                        "RefreshCoordinator: Nobody listening for generation {} result.",
                        token.0
                    );
                }
            });

        if let Err(e) = spawn_result {
            log::error!("RefreshCoordinator: Failed to spawn refresh worker: {e}");
            // The sender moved into the failed closure was dropped; report on a fresh channel.
            let (sender, receiver) = mpsc::channel();
            let _ = sender.send(RefreshEvent::Failed {
                generation: token.0,
                error: CatalogError::EnumerationUnavailable(format!(
                    "could not start refresh worker: {e}"
                )),
            });
            return receiver;
        }
        receiver
    }
}
