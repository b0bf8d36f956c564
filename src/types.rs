//! Public and internal types for the lightbox API and pipeline.

use chrono::{DateTime, TimeDelta, Utc};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::engine::tools::effective_worker_count;
use crate::utils::config::{Defaults, FIXED_PARTICIPANTS, Ranges, WorkerThreadLimits};
use crate::utils::layout::Layout;

/// One incoming file, sent from the watcher to a worker. Consumed exactly once.
#[derive(Clone, Debug)]
pub struct WorkItem {
    /// Time-ordered unique id (UUIDv7).
    pub id: Uuid,
    pub path: PathBuf,
    /// Extension is allowed and size is non-zero.
    pub valid: bool,
    /// Timestamp embedded in `id`.
    pub start: DateTime<Utc>,
    /// Time between `start` and the push onto the work queue.
    pub queued: TimeDelta,
}

/// A finished [`WorkItem`], sent from a worker to the results collector. Consumed exactly once.
#[derive(Clone, Debug)]
pub struct ResultItem {
    pub work: WorkItem,
    /// Index of the worker that processed the item.
    pub worker: usize,
    /// `start` to pickup.
    pub begin_work: TimeDelta,
    /// `start` to completion.
    pub end_work: TimeDelta,
    /// Accepted or rejected directory. `None` when the file was gone before processing.
    pub destination: Option<PathBuf>,
    /// Transform names in the order they were applied.
    pub transforms: Vec<String>,
}

/// Immutable pipeline configuration, built once and shared by every component.
///
/// Library callers construct this directly (any durations); the CLI builds it from [`Settings`]
/// after range checks.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub layout: Layout,
    /// Pause between scans of the incoming directory.
    pub poll_interval: Duration,
    pub worker_count: usize,
    /// Per-item (and per-scan) deadline.
    pub timeout: Duration,
    /// How long the startup rendezvous waits for all participants.
    pub startup_timeout: Duration,
    pub heartbeat_interval: Duration,
    /// Allowed extensions without the dot, matched case-insensitively.
    pub valid_extensions: Vec<String>,
    /// Copy each valid file into `layout.original` before transforming it.
    pub preserve_originals: bool,
    /// Command name stamped on every event.
    pub util_cmd: String,
}

impl PipelineConfig {
    /// Defaults for everything but the directories, with one worker.
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            poll_interval: Duration::from_secs(Defaults::CHECK_INTERVAL_SECS),
            worker_count: 1,
            timeout: Duration::from_secs(Defaults::TIMEOUT_SECS),
            startup_timeout: Duration::from_secs(Defaults::STARTUP_TIMEOUT_SECS),
            heartbeat_interval: Duration::from_secs(Defaults::HEARTBEAT_INTERVAL_SECS),
            valid_extensions: Defaults::VALID_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_originals: Defaults::PRESERVE_ORIGINALS,
            util_cmd: Defaults::UTIL_CMD.to_string(),
        }
    }

    /// Startup rendezvous size: every worker plus watcher, health timer, results collector and coordinator.
    pub fn participants(&self) -> usize {
        self.worker_count + FIXED_PARTICIPANTS
    }
}

/// Effective CLI options (defaults, then `.lightbox.toml`, then command line).
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub check_interval_secs: u64,
    pub cpu_factor: u32,
    /// Explicit worker count; 0 derives it from `cpu_factor`.
    pub worker_count: usize,
    pub timeout_secs: u64,
    pub valid_extensions: Vec<String>,
    pub preserve_originals: bool,
    pub verbose: bool,
    pub execute: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_interval_secs: Defaults::CHECK_INTERVAL_SECS,
            cpu_factor: Defaults::CPU_FACTOR,
            worker_count: Defaults::WORKER_COUNT,
            timeout_secs: Defaults::TIMEOUT_SECS,
            valid_extensions: Defaults::VALID_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_originals: Defaults::PRESERVE_ORIGINALS,
            verbose: false,
            execute: false,
        }
    }
}

/// Reject `value` unless it lies in `range`.
macro_rules! check_range {
    ($value:expr, $range:expr, $label:literal) => {
        if !$range.contains(&$value) {
            anyhow::bail!(
                "{} must be in {}..={} (got {})",
                $label,
                $range.start(),
                $range.end(),
                $value
            );
        }
    };
}

impl Settings {
    /// Range checks for values that may have come from the config file (clap checks CLI values).
    pub fn validate(&self) -> anyhow::Result<()> {
        check_range!(self.check_interval_secs, Ranges::CHECK_INTERVAL_SECS, "check_interval_secs");
        check_range!(self.cpu_factor, Ranges::CPU_FACTOR, "cpu_factor");
        check_range!(self.worker_count, Ranges::WORKER_COUNT, "worker_count");
        check_range!(self.timeout_secs, Ranges::TIMEOUT_SECS, "timeout");
        if self.valid_extensions.is_empty() {
            anyhow::bail!("valid_extensions must not be empty");
        }
        Ok(())
    }

    /// Worker count after applying the cpu-factor rule.
    pub fn resolved_worker_count(&self, limits: WorkerThreadLimits) -> usize {
        effective_worker_count(self.worker_count, self.cpu_factor, limits.all_threads)
    }

    pub fn to_pipeline_config(&self, layout: Layout, limits: WorkerThreadLimits) -> PipelineConfig {
        PipelineConfig {
            poll_interval: Duration::from_secs(self.check_interval_secs),
            worker_count: self.resolved_worker_count(limits),
            timeout: Duration::from_secs(self.timeout_secs),
            valid_extensions: self.valid_extensions.clone(),
            preserve_originals: self.preserve_originals,
            ..PipelineConfig::new(layout)
        }
    }
}
