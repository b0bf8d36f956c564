//! Load `.lightbox.toml` from the base directory (CLI only). Library callers build a
//! `PipelineConfig` themselves.

use serde::Deserialize;
use std::path::Path;

use crate::Settings;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct LightboxToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    check_interval_secs: Option<u64>,
    cpu_factor: Option<u32>,
    worker_count: Option<usize>,
    timeout: Option<u64>,
    valid_extensions: Option<Vec<String>>,
    preserve_originals: Option<bool>,
    verbose: Option<bool>,
}

/// Parse config text. Errors carry the toml position.
pub fn parse_lightbox_toml(s: &str) -> Result<LightboxToml, toml::de::Error> {
    toml::from_str(s)
}

/// Load `.lightbox.toml` from `dir` if present. Returns None if the file is missing or unreadable.
pub fn load_lightbox_toml(dir: &Path) -> Option<LightboxToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    log::debug!("loading {}", path.display());
    parse_lightbox_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $settings:expr, $field:ident => $settings_field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $settings.$settings_field = v;
        }
    };
}

/// Apply file config to settings (only fields present in the file). Call before applying CLI.
/// `execute` is never read from the file.
pub fn apply_file_to_settings(file: &LightboxToml, settings: &mut Settings) {
    let section = &file.settings;
    apply_file_opt!(section, settings, check_interval_secs => check_interval_secs);
    apply_file_opt!(section, settings, cpu_factor => cpu_factor);
    apply_file_opt!(section, settings, worker_count => worker_count);
    apply_file_opt!(section, settings, timeout => timeout_secs);
    apply_file_opt!(section, settings, preserve_originals => preserve_originals);
    apply_file_opt!(section, settings, verbose => verbose);
    if let Some(ref exts) = section.valid_extensions {
        settings.valid_extensions = exts
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
    }
}
