//! One-shot startup rendezvous with a bounded wait.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BarrierError {
    #[error("startup rendezvous timed out after {waited:?}: {arrived} of {expected} participants arrived")]
    TimedOut {
        arrived: usize,
        expected: usize,
        waited: Duration,
    },
    #[error("startup rendezvous broken: {arrived} of {expected} participants arrived")]
    Broken { arrived: usize, expected: usize },
}

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    released: bool,
    broken: bool,
}

/// Releases every waiter once `expected` participants have arrived.
///
/// Each waiter gives up after `timeout`; the first one to give up breaks the barrier, so every
/// other current or later waiter gets [`BarrierError::Broken`] instead of proceeding. Arrivals
/// after release pass straight through.
#[derive(Debug)]
pub struct StartupBarrier {
    expected: usize,
    timeout: Duration,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

impl StartupBarrier {
    pub fn new(expected: usize, timeout: Duration) -> Self {
        Self {
            expected,
            timeout,
            state: Mutex::new(BarrierState::default()),
            cvar: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn arrived(&self) -> usize {
        self.lock().arrived
    }

    pub fn is_broken(&self) -> bool {
        self.lock().broken
    }

    /// Block until all participants arrive, the barrier breaks, or the timeout elapses.
    pub fn wait(&self) -> Result<(), BarrierError> {
        let mut state = self.lock();
        if state.broken {
            return Err(BarrierError::Broken {
                arrived: state.arrived,
                expected: self.expected,
            });
        }
        if state.released {
            return Ok(());
        }
        state.arrived += 1;
        if state.arrived >= self.expected {
            state.released = true;
            self.cvar.notify_all();
            return Ok(());
        }

        let began = Instant::now();
        let deadline = began + self.timeout;
        loop {
            if state.released {
                return Ok(());
            }
            if state.broken {
                return Err(BarrierError::Broken {
                    arrived: state.arrived,
                    expected: self.expected,
                });
            }
            let now = Instant::now();
            if now >= deadline {
                state.broken = true;
                self.cvar.notify_all();
                return Err(BarrierError::TimedOut {
                    arrived: state.arrived,
                    expected: self.expected,
                    waited: now - began,
                });
            }
            state = self
                .cvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}
