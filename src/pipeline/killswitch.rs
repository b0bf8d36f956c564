//! Deadline timer armed around risky work. Firing only sets the fail-fast latch; the stuck
//! operation is abandoned, never interrupted.

use anyhow::{Context, Result};
use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use log::error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use super::failfast::{FailFast, Trip};

const ARMED: u8 = 0;
const DISARMED: u8 = 1;
const FIRED: u8 = 2;

/// An armed deadline. Disarm (or drop) it when the work completes.
///
/// Firing and disarming race on one atomic transition out of `ARMED`; whichever loses does nothing,
/// so a timer that expires just after the work finished never trips the latch.
pub struct KillSwitch {
    state: Arc<AtomicU8>,
    cancel_tx: Option<Sender<()>>,
}

impl KillSwitch {
    /// Start a watchdog thread that trips `failfast` with `trip()` unless disarmed within `timeout`.
    pub fn arm<F>(timeout: Duration, failfast: Arc<FailFast>, trip: F) -> Result<Self>
    where
        F: FnOnce() -> Trip + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(ARMED));
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let watchdog_state = Arc::clone(&state);
        thread::Builder::new()
            .name("killswitch".to_string())
            .spawn(move || {
                // Disconnected means the switch was disarmed or dropped.
                if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(timeout)
                    && watchdog_state
                        .compare_exchange(ARMED, FIRED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    let trip = trip();
                    error!("kill switch: {}", trip);
                    failfast.trip(trip);
                }
            })
            .context("spawn kill switch thread")?;
        Ok(Self {
            state,
            cancel_tx: Some(cancel_tx),
        })
    }

    fn cancel(&mut self) -> bool {
        let disarmed = self
            .state
            .compare_exchange(ARMED, DISARMED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.cancel_tx.take();
        disarmed
    }

    /// Cancel the deadline. Returns false if it had already fired.
    pub fn disarm(mut self) -> bool {
        self.cancel()
    }

    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::Acquire) == FIRED
    }
}

impl Drop for KillSwitch {
    fn drop(&mut self) {
        self.cancel();
    }
}
