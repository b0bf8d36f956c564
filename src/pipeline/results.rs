//! Results collector: drains the result queue and emits `finish` events.

use anyhow::Result;
use chrono::TimeDelta;
use crossbeam_channel::Receiver;
use log::error;
use std::sync::Arc;

use crate::events::{Event, EventSink};
use crate::{PipelineConfig, ResultItem};

use super::context::SharedState;
use super::failfast::{FailFast, Trip};

pub struct ResultsCollector {
    config: Arc<PipelineConfig>,
    result_rx: Receiver<ResultItem>,
    failfast: Arc<FailFast>,
    sink: Arc<dyn EventSink>,
}

impl ResultsCollector {
    pub fn new(shared: &SharedState) -> Self {
        log::info!("results");
        Self {
            config: Arc::clone(&shared.config),
            result_rx: shared.result_rx.clone(),
            failfast: Arc::clone(&shared.failfast),
            sink: Arc::clone(&shared.sink),
        }
    }

    pub fn run(self) -> Result<()> {
        while let Ok(result) = self.result_rx.recv() {
            if let Err(violation) = check_integrity(&result, &self.config) {
                error!("invalid result item {}: {}", result.work.id, violation);
                self.failfast.trip(Trip::Integrity(violation));
                return Ok(());
            }
            self.sink.emit(&Event::finish(&self.config.util_cmd, &result));
        }
        Ok(())
    }
}

/// Shape checks a well-formed [`ResultItem`] always passes.
pub fn check_integrity(result: &ResultItem, config: &PipelineConfig) -> Result<(), String> {
    if result.begin_work < TimeDelta::zero() {
        return Err(format!("negative begin_work {}", result.begin_work));
    }
    if result.begin_work > result.end_work {
        return Err(format!(
            "begin_work {} after end_work {}",
            result.begin_work, result.end_work
        ));
    }
    if result.worker >= config.worker_count {
        return Err(format!(
            "worker index {} out of range (worker count {})",
            result.worker, config.worker_count
        ));
    }
    let layout = &config.layout;
    match result.destination.as_deref() {
        Some(dest) if dest == layout.modified && !result.work.valid => {
            return Err("invalid item routed to accepted output".to_string());
        }
        Some(dest) if dest == layout.rejected && result.work.valid => {
            return Err("valid item routed to rejected output".to_string());
        }
        Some(dest) if dest != layout.modified && dest != layout.rejected => {
            return Err(format!("unknown destination {}", dest.display()));
        }
        _ => {}
    }
    if !result.work.valid && !result.transforms.is_empty() {
        return Err("transforms applied to an invalid item".to_string());
    }
    Ok(())
}
