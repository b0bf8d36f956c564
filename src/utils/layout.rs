//! The four I/O directories under a base directory.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::config::DirNames;

/// Incoming files are polled from `incoming`; valid files land in `modified` (with an untouched copy in
/// `original`), invalid ones in `rejected`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    pub incoming: PathBuf,
    pub modified: PathBuf,
    pub original: PathBuf,
    pub rejected: PathBuf,
}

impl Layout {
    pub fn under(base: &Path) -> Self {
        Self {
            incoming: base.join(DirNames::INCOMING),
            modified: base.join(DirNames::MODIFIED),
            original: base.join(DirNames::ORIGINAL),
            rejected: base.join(DirNames::REJECTED),
        }
    }

    /// `(label, path)` for each directory.
    pub fn dirs(&self) -> [(&'static str, &Path); 4] {
        [
            (DirNames::INCOMING, self.incoming.as_path()),
            (DirNames::MODIFIED, self.modified.as_path()),
            (DirNames::ORIGINAL, self.original.as_path()),
            (DirNames::REJECTED, self.rejected.as_path()),
        ]
    }

    pub fn create_all(&self) -> Result<()> {
        for (label, dir) in self.dirs() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create {} directory {}", label, dir.display()))?;
            log::debug!("ensured {} directory {}", label, dir.display());
        }
        Ok(())
    }

    /// Fail unless every directory exists. The pipeline never creates them itself.
    pub fn ensure_exists(&self) -> Result<()> {
        for (label, dir) in self.dirs() {
            if !dir.is_dir() {
                bail!(
                    "missing {} directory {} (create it with `{} makedirs --execute`)",
                    label,
                    dir.display(),
                    env!("CARGO_PKG_NAME")
                );
            }
        }
        Ok(())
    }
}
