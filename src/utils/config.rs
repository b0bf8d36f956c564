//! Application configuration constants.
//! Defaults, ranges and directory names in one place.

use std::ops::RangeInclusive;
use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    event_target: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                event_target: format!("{pkg}::events"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file, e.g. `.lightbox.toml`.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Log target used for structured lifecycle events.
    pub fn event_target(&self) -> &str {
        &self.event_target
    }
}

// ---- I/O directories ----

/// Subdirectory names under the base directory.
pub struct DirNames;

impl DirNames {
    pub const INCOMING: &'static str = "incoming";
    pub const MODIFIED: &'static str = "modified";
    pub const ORIGINAL: &'static str = "original";
    pub const REJECTED: &'static str = "rejected";
}

// ---- Defaults (config file overrides defaults; command line overrides config file) ----

pub struct Defaults;

impl Defaults {
    pub const CHECK_INTERVAL_SECS: u64 = 5;
    pub const CPU_FACTOR: u32 = 2;
    /// 0 means "derive from cpu factor".
    pub const WORKER_COUNT: usize = 0;
    pub const TIMEOUT_SECS: u64 = 60;
    pub const STARTUP_TIMEOUT_SECS: u64 = 60;
    pub const HEARTBEAT_INTERVAL_SECS: u64 = 60;
    pub const VALID_EXTENSIONS: &'static [&'static str] = &["jpeg", "jpg"];
    pub const PRESERVE_ORIGINALS: bool = true;
    pub const UTIL_CMD: &'static str = "run";
}

/// Accepted ranges for CLI and config-file values.
pub struct Ranges;

impl Ranges {
    pub const CHECK_INTERVAL_SECS: RangeInclusive<u64> = 3..=300;
    pub const CPU_FACTOR: RangeInclusive<u32> = 0..=15;
    pub const WORKER_COUNT: RangeInclusive<usize> = 0..=127;
    pub const TIMEOUT_SECS: RangeInclusive<u64> = 10..=600;
}

// ---- Pipeline topology ----

/// Startup participants besides the workers: watcher, health timer, results collector, fail-fast coordinator.
pub const FIXED_PARTICIPANTS: usize = 4;

/// The health timer confirms startup after `timeout * HEALTH_STARTUP_FACTOR`.
pub const HEALTH_STARTUP_FACTOR: f64 = 1.5;

/// The watcher's watermark lags the scan start by this much. Filesystem timestamps come from a
/// coarse clock (and are whole seconds on some filesystems), so a file created right after the
/// scan started can carry an earlier ctime.
pub const WATERMARK_SLACK: Duration = Duration::from_secs(1);

// ---- Worker threads ----

/// CPU count used to derive the worker count when none is given explicitly.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Logical CPUs; set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
}

impl WorkerThreadLimits {
    pub fn current() -> Self {
        Self {
            all_threads: num_cpus::get(),
        }
    }
}
