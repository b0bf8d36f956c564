//! Ingestion watcher: polls the incoming directory and queues new files for the workers.

use anyhow::{Context, Result};
use chrono::Utc;
use crossbeam_channel::Sender;
use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::engine::tools::{invalid_reasons, start_time_of, status_change_time};
use crate::events::{Event, EventSink};
use crate::utils::config::WATERMARK_SLACK;
use crate::{PipelineConfig, WorkItem};

use super::context::{InFlight, SharedState};
use super::failfast::{FailFast, Trip};
use super::killswitch::KillSwitch;

/// One scan cycle's view of a directory entry.
pub enum ScanOutcome {
    /// New since the last scan: (path, size).
    New(PathBuf, u64),
    /// Seen before, still in flight, not a regular file, or gone before it could be stat'ed.
    Skip,
}

pub struct IngestionWatcher {
    config: Arc<PipelineConfig>,
    work_tx: Sender<WorkItem>,
    failfast: Arc<FailFast>,
    in_flight: Arc<InFlight>,
    sink: Arc<dyn EventSink>,
    /// Entries whose ctime is older than this were handled by an earlier scan.
    watermark: SystemTime,
    /// Queued entries still above the watermark, with the ctime they had when queued.
    recent: HashMap<PathBuf, SystemTime>,
}

impl IngestionWatcher {
    pub fn new(shared: &SharedState) -> Self {
        log::info!("watcher");
        Self {
            config: Arc::clone(&shared.config),
            work_tx: shared.work_tx.clone(),
            failfast: Arc::clone(&shared.failfast),
            in_flight: Arc::clone(&shared.in_flight),
            sink: Arc::clone(&shared.sink),
            watermark: UNIX_EPOCH,
            recent: HashMap::new(),
        }
    }

    /// Scan, sleep, repeat. Returns once the fail-fast latch is set; errors are fatal.
    pub fn run(mut self) -> Result<()> {
        let timeout = self.config.timeout;
        loop {
            if self.failfast.is_set() {
                return Ok(());
            }
            let kill_switch = KillSwitch::arm(timeout, Arc::clone(&self.failfast), move || {
                Trip::WatcherTimeout { timeout }
            })?;
            let queued = self.check_incoming()?;
            if !kill_switch.disarm() {
                anyhow::bail!("scan cycle overran its {:?} deadline", timeout);
            }
            if queued > 0 {
                debug!("queued {} file(s)", queued);
            }
            if self.failfast.wait_timeout(self.config.poll_interval).is_some() {
                return Ok(());
            }
        }
    }

    /// One scan of the incoming directory. Returns the number of items queued.
    pub fn check_incoming(&mut self) -> Result<usize> {
        let scan_started = SystemTime::now();
        let incoming = self.config.layout.incoming.clone();
        let mut queued = 0;

        // Non-recursive: nested directories are ignored.
        for entry in WalkDir::new(&incoming).min_depth(1).max_depth(1) {
            let entry = entry.with_context(|| format!("scan {}", incoming.display()))?;
            if let ScanOutcome::New(path, size) = self.classify_entry(&entry)? {
                self.submit(path, size)?;
                queued += 1;
            }
        }

        let watermark = scan_started
            .checked_sub(WATERMARK_SLACK)
            .unwrap_or(UNIX_EPOCH);
        self.recent.retain(|_, changed| *changed > watermark);
        self.watermark = watermark;
        Ok(queued)
    }

    fn classify_entry(&mut self, entry: &walkdir::DirEntry) -> Result<ScanOutcome> {
        if !entry.file_type().is_file() {
            return Ok(ScanOutcome::Skip);
        }
        // Checked before the stat: a worker releases a path only after moving the file out, so a
        // released path either stats as NotFound or is a new file.
        if self.in_flight.contains(entry.path()) {
            return Ok(ScanOutcome::Skip);
        }
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            // Moved away between listing and stat.
            Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => {
                return Ok(ScanOutcome::Skip);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("stat {}", entry.path().display()));
            }
        };
        let changed = status_change_time(&meta);
        if changed <= self.watermark || self.recent.get(entry.path()) == Some(&changed) {
            return Ok(ScanOutcome::Skip);
        }
        self.recent.insert(entry.path().to_path_buf(), changed);
        Ok(ScanOutcome::New(entry.path().to_path_buf(), meta.len()))
    }

    fn submit(&self, path: PathBuf, size: u64) -> Result<()> {
        self.in_flight.claim(&path);
        let item = new_work_item(path, size, &self.config.valid_extensions);
        let event = Event::start(&self.config.util_cmd, &item);
        self.work_tx
            .send(item)
            .context("work queue disconnected")?;
        self.sink.emit(&event);
        Ok(())
    }
}

/// Fresh id, validity check, and queued time for a file about to be queued.
pub fn new_work_item(path: PathBuf, size: u64, valid_extensions: &[String]) -> WorkItem {
    let id = Uuid::now_v7();
    let start = start_time_of(&id);
    let reasons = invalid_reasons(&path, size, valid_extensions);
    if !reasons.is_empty() {
        warn!("{}; path: {}", reasons.join("; "), path.display());
    }
    WorkItem {
        id,
        valid: reasons.is_empty(),
        queued: Utc::now() - start,
        start,
        path,
    }
}

