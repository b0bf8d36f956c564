//! Shared state: queues, in-flight paths, startup rendezvous, fail-fast latch, configuration and
//! event sink.
//! Built once in `launch` and cloned into every component.

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::events::EventSink;
use crate::{PipelineConfig, ResultItem, WorkItem};

use super::barrier::StartupBarrier;
use super::failfast::FailFast;

/// Handles shared by every component. Cloning is cheap (channel ends and `Arc`s).
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<PipelineConfig>,
    pub work_tx: Sender<WorkItem>,
    pub work_rx: Receiver<WorkItem>,
    pub result_tx: Sender<ResultItem>,
    pub result_rx: Receiver<ResultItem>,
    pub barrier: Arc<StartupBarrier>,
    pub failfast: Arc<FailFast>,
    pub in_flight: Arc<InFlight>,
    pub sink: Arc<dyn EventSink>,
}

/// Incoming paths that are queued or being processed. The watcher claims a path when it queues
/// it; the worker releases it once the file has left the incoming directory. Transforms rewrite
/// files in place, so a claimed path must be skipped whatever its ctime says.
#[derive(Debug, Default)]
pub struct InFlight {
    paths: Mutex<HashSet<PathBuf>>,
}

impl InFlight {
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.paths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false if `path` was already claimed.
    pub fn claim(&self, path: &Path) -> bool {
        self.lock().insert(path.to_path_buf())
    }

    pub fn release(&self, path: &Path) {
        self.lock().remove(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Unbounded work and result queues plus a rendezvous sized for `config.participants()`.
pub fn create_shared_state(config: PipelineConfig, sink: Arc<dyn EventSink>) -> SharedState {
    let (work_tx, work_rx) = unbounded::<WorkItem>();
    let (result_tx, result_rx) = unbounded::<ResultItem>();
    let barrier = Arc::new(StartupBarrier::new(
        config.participants(),
        config.startup_timeout,
    ));

    SharedState {
        config: Arc::new(config),
        work_tx,
        work_rx,
        result_tx,
        result_rx,
        barrier,
        failfast: Arc::new(FailFast::new()),
        in_flight: Arc::new(InFlight::default()),
        sink,
    }
}
