//! Write-behind queue for snapshot blobs.
//!
//! Each [`BlobKey`] has a lane with a generation counter and an async gate.
//! Scheduling a write bumps the lane's generation and spawns a task; the task
//! takes the gate and only touches the store if no newer write was scheduled
//! in the meantime. Whatever order the tasks run in, the last value handed to
//! [`WriteBehind::schedule`] is the one left in the store.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use feedline_store::KvStore;

use crate::error::{SyncError, SyncResult};
use crate::keys::BlobKey;

/// Counters describing what the write-behind queue has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub scheduled: u64,
    pub written: u64,
    pub superseded: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Lane {
    latest: AtomicU64,
    gate: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct Counters {
    scheduled: AtomicU64,
    written: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
}

struct Shared<S> {
    store: Arc<S>,
    lanes: [Lane; 4],
    counters: Counters,
}

/// What to do with a blob once its turn comes.
pub(crate) enum WriteOp {
    Put(String),
    Delete,
}

pub(crate) struct WriteBehind<S> {
    shared: Arc<Shared<S>>,
    runtime: Handle,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: KvStore + 'static> WriteBehind<S> {
    /// Must be called from within a tokio runtime; background writes are
    /// spawned onto it.
    pub(crate) fn new(store: Arc<S>) -> SyncResult<Self> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        Ok(Self {
            shared: Arc::new(Shared {
                store,
                lanes: Default::default(),
                counters: Counters::default(),
            }),
            runtime,
            pending: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn schedule(&self, key: BlobKey, op: WriteOp) {
        let lane = &self.shared.lanes[key.index()];
        let generation = lane.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.counters.scheduled.fetch_add(1, Ordering::Relaxed);

        let shared = Arc::clone(&self.shared);
        let task = self
            .runtime
            .spawn(async move { shared.run(key, generation, op).await });

        let mut pending = self.pending.lock().expect("lock poisoned");
        pending.retain(|handle| !handle.is_finished());
        pending.push(task);
    }

    /// Record a write that never got as far as the store.
    pub(crate) fn record_failure(&self) {
        self.shared.counters.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Wait until every write scheduled so far has finished.
    pub(crate) async fn flush(&self) {
        loop {
            let batch = std::mem::take(&mut *self.pending.lock().expect("lock poisoned"));
            if batch.is_empty() {
                return;
            }
            for task in batch {
                if let Err(e) = task.await {
                    warn!(error = %e, "background write task did not complete");
                }
            }
        }
    }

    pub(crate) fn stats(&self) -> WriteStats {
        let c = &self.shared.counters;
        WriteStats {
            scheduled: c.scheduled.load(Ordering::Relaxed),
            written: c.written.load(Ordering::Relaxed),
            superseded: c.superseded.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }
}

impl<S: KvStore> Shared<S> {
    async fn run(&self, key: BlobKey, generation: u64, op: WriteOp) {
        let lane = &self.lanes[key.index()];
        let _turn = lane.gate.lock().await;

        if lane.latest.load(Ordering::SeqCst) != generation {
            self.counters.superseded.fetch_add(1, Ordering::Relaxed);
            debug!(%key, generation, "write superseded before reaching the store");
            return;
        }

        let result = match op {
            WriteOp::Put(value) => {
                let bytes = value.len();
                let result = self.store.set(key.name(), value, key.scope()).await;
                if result.is_ok() {
                    debug!(%key, generation, bytes, "blob written");
                }
                result
            }
            WriteOp::Delete => self.store.delete(key.name(), key.scope()).await,
        };

        match result {
            Ok(()) => {
                self.counters.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%key, generation, error = %e, "blob write failed; in-memory state kept");
            }
        }
    }
}
