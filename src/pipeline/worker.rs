//! Worker pool: each worker takes one item at a time, transforms or rejects it, moves it out of
//! the incoming directory, and reports a result.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use std::sync::Arc;

use crate::engine::tools::{copy_into, move_into};
use crate::transforms::TransformRegistry;
use crate::{PipelineConfig, ResultItem, WorkItem};

use super::context::{InFlight, SharedState};
use super::failfast::{FailFast, Trip};
use super::killswitch::KillSwitch;

pub struct Worker {
    index: usize,
    config: Arc<PipelineConfig>,
    work_rx: Receiver<WorkItem>,
    result_tx: Sender<ResultItem>,
    failfast: Arc<FailFast>,
    in_flight: Arc<InFlight>,
    registry: Arc<TransformRegistry>,
}

impl Worker {
    pub fn new(index: usize, shared: &SharedState, registry: Arc<TransformRegistry>) -> Self {
        info!("worker: {}", index);
        Self {
            index,
            config: Arc::clone(&shared.config),
            work_rx: shared.work_rx.clone(),
            result_tx: shared.result_tx.clone(),
            failfast: Arc::clone(&shared.failfast),
            in_flight: Arc::clone(&shared.in_flight),
            registry,
        }
    }

    /// Block on the work queue forever. Any error is fatal for the whole pipeline; the error
    /// carries the offending item.
    pub fn run(self) -> Result<()> {
        let timeout = self.config.timeout;
        let worker = self.index;
        while let Ok(item) = self.work_rx.recv() {
            let id = item.id;
            let item_context = format!("id: {}; path: {}", item.id, item.path.display());
            let kill_switch = KillSwitch::arm(timeout, Arc::clone(&self.failfast), move || {
                Trip::WorkerTimeout {
                    worker,
                    id,
                    timeout,
                }
            })?;
            let result = self
                .process(item)
                .with_context(|| format!("processing {}", item_context))?;
            if !kill_switch.disarm() {
                bail!("abandoned {} after its {:?} deadline", item_context, timeout);
            }
            self.result_tx
                .send(result)
                .context("result queue disconnected")?;
        }
        debug!("worker {}: work queue closed", worker);
        Ok(())
    }

    /// Transform (valid) or reject (invalid) one item and build its result. A file that has
    /// disappeared is skipped with a warning and still produces a result. The path is released
    /// back to the watcher once the file has left the incoming directory.
    pub fn process(&self, item: WorkItem) -> Result<ResultItem> {
        let begin_work = Utc::now() - item.start;
        let layout = &self.config.layout;
        let mut transforms = Vec::new();

        let exists = item
            .path
            .try_exists()
            .with_context(|| format!("check {}", item.path.display()))?;
        let destination = if !exists {
            warn!(
                "file does not currently exist; worker: {}; id: {}; path: {}",
                self.index,
                item.id,
                item.path.display()
            );
            None
        } else if item.valid {
            if self.config.preserve_originals {
                copy_into(&item.path, &layout.original)?;
            }
            transforms = self.registry.apply_all(&item.path)?;
            move_into(&item.path, &layout.modified)?;
            Some(layout.modified.clone())
        } else {
            move_into(&item.path, &layout.rejected)?;
            Some(layout.rejected.clone())
        };
        self.in_flight.release(&item.path);

        let end_work = Utc::now() - item.start;
        Ok(ResultItem {
            work: item,
            worker: self.index,
            begin_work,
            end_work,
            destination,
            transforms,
        })
    }
}
