use anyhow::Result;
use image::imageops::FilterType;
use std::path::Path;

use super::{Transform, open_image, save_image};

/// Shrink to fit within `max_width` × `max_height`, keeping the aspect ratio. Never enlarges.
#[derive(Clone, Debug)]
pub struct Resize {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for Resize {
    fn default() -> Self {
        Self {
            max_width: 750,
            max_height: 500,
        }
    }
}

impl Resize {
    /// Target size for a `width` × `height` image, or `None` if it already fits.
    pub fn target_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if width <= self.max_width && height <= self.max_height {
            return None;
        }
        let scale = f64::min(
            self.max_width as f64 / width as f64,
            self.max_height as f64 / height as f64,
        );
        let w = ((width as f64 * scale).round() as u32).clamp(1, self.max_width);
        let h = ((height as f64 * scale).round() as u32).clamp(1, self.max_height);
        Some((w, h))
    }
}

impl Transform for Resize {
    fn name(&self) -> &str {
        "resize"
    }

    fn apply(&self, path: &Path) -> Result<String> {
        let img = open_image(path)?;
        if let Some((w, h)) = self.target_size(img.width(), img.height()) {
            save_image(img.resize_exact(w, h, FilterType::Lanczos3), path)?;
        }
        Ok(self.name().to_string())
    }
}
