//! Path, file and time utilities

use anyhow::{Context, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// `explicit` wins when non-zero; otherwise `available * cpu_factor + 1`.
pub fn effective_worker_count(explicit: usize, cpu_factor: u32, available: usize) -> usize {
    if explicit > 0 {
        explicit
    } else {
        available * cpu_factor as usize + 1
    }
}

/// True if the extension (without the dot) matches one of `allowed`, ignoring case.
pub fn has_valid_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    allowed
        .iter()
        .any(|a| a.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Reasons a file is rejected. Empty means valid.
pub fn invalid_reasons(path: &Path, size: u64, allowed: &[String]) -> Vec<String> {
    let mut reasons = Vec::new();
    if !has_valid_extension(path, allowed) {
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_uppercase()))
            .unwrap_or_else(|| "<none>".to_string());
        reasons.push(format!("invalid extension: {ext}"));
    }
    if size == 0 {
        reasons.push("zero-length file".to_string());
    }
    reasons
}

/// Last status-change time (ctime). Falls back to mtime where ctime is unavailable.
#[cfg(unix)]
pub fn status_change_time(meta: &Metadata) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    match (u64::try_from(meta.ctime()), u32::try_from(meta.ctime_nsec())) {
        (Ok(secs), Ok(nanos)) => UNIX_EPOCH + Duration::new(secs, nanos),
        _ => UNIX_EPOCH,
    }
}

#[cfg(not(unix))]
pub fn status_change_time(meta: &Metadata) -> SystemTime {
    meta.modified().unwrap_or(UNIX_EPOCH)
}

/// Timestamp embedded in a UUIDv7, or now when `id` carries none.
pub fn start_time_of(id: &Uuid) -> DateTime<Utc> {
    id.get_timestamp()
        .and_then(|ts| {
            let (secs, nanos) = ts.to_unix();
            DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos)
        })
        .unwrap_or_else(Utc::now)
}

/// Seconds with millisecond resolution, for events.
pub fn as_secs_f64(td: TimeDelta) -> f64 {
    td.num_milliseconds() as f64 / 1000.0
}

fn target_in(path: &Path, dir: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .with_context(|| format!("no file name in {}", path.display()))?;
    Ok(dir.join(name))
}

/// Move `path` into `dir` keeping its name. Rename first; copy + remove across devices.
pub fn move_into(path: &Path, dir: &Path) -> Result<PathBuf> {
    let dest = target_in(path, dir)?;
    match fs::rename(path, &dest) {
        Ok(()) => Ok(dest),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(path, &dest)
                .with_context(|| format!("copy {} -> {}", path.display(), dest.display()))?;
            fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
            Ok(dest)
        }
        Err(e) => Err(e).with_context(|| format!("move {} -> {}", path.display(), dest.display())),
    }
}

/// Copy `path` into `dir` keeping its name.
pub fn copy_into(path: &Path, dir: &Path) -> Result<PathBuf> {
    let dest = target_in(path, dir)?;
    fs::copy(path, &dest)
        .with_context(|| format!("copy {} -> {}", path.display(), dest.display()))?;
    Ok(dest)
}
