//! Health timer: confirms a successful (re)start, then emits periodic liveness markers that
//! external alerting can watch for.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::events::{Event, EventSink};
use crate::utils::config::HEALTH_STARTUP_FACTOR;

use super::context::SharedState;
use super::failfast::FailFast;

pub struct HealthTimer {
    startup_delay: Duration,
    heartbeat_interval: Duration,
    util_cmd: String,
    failfast: Arc<FailFast>,
    sink: Arc<dyn EventSink>,
}

impl HealthTimer {
    pub fn new(shared: &SharedState) -> Self {
        log::info!("timer");
        Self {
            startup_delay: shared.config.timeout.mul_f64(HEALTH_STARTUP_FACTOR),
            heartbeat_interval: shared.config.heartbeat_interval,
            util_cmd: shared.config.util_cmd.clone(),
            failfast: Arc::clone(&shared.failfast),
            sink: Arc::clone(&shared.sink),
        }
    }

    /// Returns once the fail-fast latch is set.
    pub fn run(self) -> Result<()> {
        if self.failfast.wait_timeout(self.startup_delay).is_some() {
            return Ok(());
        }
        self.sink.emit(&Event::started(
            &self.util_cmd,
            self.startup_delay.as_secs_f64(),
        ));
        loop {
            self.sink.emit(&Event::heartbeat(&self.util_cmd));
            if self.failfast.wait_timeout(self.heartbeat_interval).is_some() {
                return Ok(());
            }
        }
    }
}
