//! The fail-fast latch and the coordinator that waits on it from the main thread.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use super::barrier::StartupBarrier;
use super::context::SharedState;

/// Why the latch was set.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Trip {
    #[error("interrupted by operator")]
    Interrupted,
    #[error("startup failed: {0}")]
    StartupTimeout(String),
    #[error("watcher hit {timeout:?} timeout")]
    WatcherTimeout { timeout: Duration },
    #[error("watcher failed: {0}")]
    WatcherFailed(String),
    #[error("worker {worker} hit {timeout:?} timeout processing {id}")]
    WorkerTimeout {
        worker: usize,
        id: Uuid,
        timeout: Duration,
    },
    #[error("worker {worker} failed: {message}")]
    WorkerFailed { worker: usize, message: String },
    #[error("invalid result item: {0}")]
    Integrity(String),
    #[error("results collector failed: {0}")]
    ResultsFailed(String),
    #[error("health timer failed: {0}")]
    TimerFailed(String),
    #[error("{component} panicked: {message}")]
    Panicked { component: String, message: String },
}

/// Process-wide set-once latch. The first [`Trip`] wins; later ones are ignored.
#[derive(Debug, Default)]
pub struct FailFast {
    tripped: Mutex<Option<Trip>>,
    cvar: Condvar,
}

impl FailFast {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Trip>> {
        self.tripped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the latch. Returns true if this call set it, false if it was already set.
    pub fn trip(&self, trip: Trip) -> bool {
        let mut tripped = self.lock();
        if let Some(first) = tripped.as_ref() {
            debug!("fail-fast already set ({}); ignoring: {}", first, trip);
            return false;
        }
        *tripped = Some(trip);
        self.cvar.notify_all();
        true
    }

    pub fn is_set(&self) -> bool {
        self.lock().is_some()
    }

    /// The winning trip, if any.
    pub fn reason(&self) -> Option<Trip> {
        self.lock().clone()
    }

    /// Block until the latch is set.
    pub fn wait(&self) -> Trip {
        let mut tripped = self.lock();
        loop {
            if let Some(trip) = tripped.as_ref() {
                return trip.clone();
            }
            tripped = self
                .cvar
                .wait(tripped)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block up to `timeout`; `Some` if the latch is (or becomes) set. Doubles as an interruptible sleep.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Trip> {
        let tripped = self.lock();
        let (tripped, _) = self
            .cvar
            .wait_timeout_while(tripped, timeout, |t| t.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        tripped.clone()
    }
}

/// How the pipeline ended. `main` turns this into the exit status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    Interrupted,
    Failed(Trip),
}

impl Termination {
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Interrupted => 0,
            Termination::Failed(_) => 1,
        }
    }
}

/// Main-thread participant: joins the startup rendezvous, then blocks until the latch is set.
pub struct FailFastCoordinator {
    barrier: Arc<StartupBarrier>,
    failfast: Arc<FailFast>,
}

impl FailFastCoordinator {
    pub fn new(shared: &SharedState) -> Self {
        info!("failfast");
        Self {
            barrier: Arc::clone(&shared.barrier),
            failfast: Arc::clone(&shared.failfast),
        }
    }

    pub fn failfast(&self) -> &Arc<FailFast> {
        &self.failfast
    }

    pub fn run(self) -> Termination {
        match self.barrier.wait() {
            Ok(()) => info!("failfast running"),
            Err(e) => {
                error!("{}", e);
                self.failfast.trip(Trip::StartupTimeout(e.to_string()));
            }
        }
        match self.failfast.wait() {
            Trip::Interrupted => {
                info!("Exiting on interrupt");
                Termination::Interrupted
            }
            trip => {
                error!("Exiting on a fail-fast event: {}", trip);
                Termination::Failed(trip)
            }
        }
    }
}

/// Route Ctrl+C into the latch so an operator stop takes the same exit path. Once per process.
pub fn install_interrupt_handler(failfast: Arc<FailFast>) -> Result<()> {
    ctrlc::set_handler(move || {
        failfast.trip(Trip::Interrupted);
    })
    .context("set Ctrl+C handler")
}
