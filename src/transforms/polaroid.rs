use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage, imageops};
use std::path::Path;

use super::{Transform, open_image, save_image};

const FRAME: Rgb<u8> = Rgb([250, 250, 245]);
const EDGE: Rgb<u8> = Rgb([190, 190, 190]);

/// Instant-photo frame: even margins on three sides, a deeper bottom margin, thin grey edge.
#[derive(Clone, Debug)]
pub struct Polaroid {
    /// Side margin as a fraction of the longer image side.
    pub margin_ratio: f64,
    /// Bottom margin as a multiple of the side margin.
    pub bottom_factor: u32,
}

impl Default for Polaroid {
    fn default() -> Self {
        Self {
            margin_ratio: 0.05,
            bottom_factor: 4,
        }
    }
}

impl Polaroid {
    /// Side margin in pixels for a `width` × `height` image; at least 2 so the edge fits.
    pub fn margin(&self, width: u32, height: u32) -> u32 {
        ((width.max(height) as f64 * self.margin_ratio).round() as u32).max(2)
    }

    pub fn frame(&self, img: &RgbImage) -> RgbImage {
        let (w, h) = img.dimensions();
        let m = self.margin(w, h);
        let bottom = m * self.bottom_factor;
        let (fw, fh) = (w + 2 * m, h + m + bottom);

        let mut framed = RgbImage::from_fn(fw, fh, |x, y| {
            if x == 0 || y == 0 || x == fw - 1 || y == fh - 1 {
                EDGE
            } else {
                FRAME
            }
        });
        imageops::replace(&mut framed, img, m as i64, m as i64);
        framed
    }
}

impl Transform for Polaroid {
    fn name(&self) -> &str {
        "polaroid"
    }

    fn apply(&self, path: &Path) -> Result<String> {
        let img = open_image(path)?.to_rgb8();
        save_image(DynamicImage::ImageRgb8(self.frame(&img)), path)?;
        Ok(self.name().to_string())
    }
}
