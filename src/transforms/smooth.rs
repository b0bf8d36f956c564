use anyhow::Result;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;

use super::{Transform, open_image, save_image};

/// Edge-preserving smoothing with the Kuwahara filter.
#[derive(Clone, Debug)]
pub struct Smooth {
    pub radius: u32,
}

impl Default for Smooth {
    fn default() -> Self {
        Self { radius: 2 }
    }
}

impl Transform for Smooth {
    fn name(&self) -> &str {
        "smooth"
    }

    fn apply(&self, path: &Path) -> Result<String> {
        let img = open_image(path)?.to_rgb8();
        save_image(DynamicImage::ImageRgb8(kuwahara(&img, self.radius)), path)?;
        Ok(self.name().to_string())
    }
}

fn luma(p: &Rgb<u8>) -> f64 {
    let [r, g, b] = p.0;
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

/// Each output pixel is the mean colour of whichever of its four `(radius+1)²` corner windows has
/// the lowest luminance variance. Windows are clamped at the image border.
pub fn kuwahara(src: &RgbImage, radius: u32) -> RgbImage {
    let (width, height) = src.dimensions();
    let mut out = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return out;
    }
    let r = radius as i64;
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    for y in 0..height {
        for x in 0..width {
            let mut best: Option<(f64, [f64; 3])> = None;
            for (ox, oy) in [(-r, -r), (0, -r), (-r, 0), (0, 0)] {
                let mut sum = [0.0f64; 3];
                let mut lum_sum = 0.0;
                let mut lum_sq = 0.0;
                let mut n = 0.0;
                for dy in oy..=oy + r {
                    for dx in ox..=ox + r {
                        let px = (x as i64 + dx).clamp(0, max_x) as u32;
                        let py = (y as i64 + dy).clamp(0, max_y) as u32;
                        let p = src.get_pixel(px, py);
                        for (acc, c) in sum.iter_mut().zip(p.0) {
                            *acc += c as f64;
                        }
                        let l = luma(p);
                        lum_sum += l;
                        lum_sq += l * l;
                        n += 1.0;
                    }
                }
                let mean_lum = lum_sum / n;
                let variance = lum_sq / n - mean_lum * mean_lum;
                if best.is_none_or(|(v, _)| variance < v) {
                    best = Some((variance, sum.map(|s| s / n)));
                }
            }
            if let Some((_, mean)) = best {
                out.put_pixel(x, y, Rgb(mean.map(|c| c.round().clamp(0.0, 255.0) as u8)));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_is_unchanged() {
        let img = RgbImage::from_pixel(8, 6, Rgb([40, 120, 200]));
        assert_eq!(kuwahara(&img, 2), img);
    }

    #[test]
    fn hard_edge_is_preserved() {
        let img = RgbImage::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        assert_eq!(kuwahara(&img, 2), img);
    }

    #[test]
    fn lone_speck_does_not_bleed() {
        let mut img = RgbImage::from_pixel(9, 9, Rgb([10, 10, 10]));
        img.put_pixel(4, 4, Rgb([250, 250, 250]));
        let out = kuwahara(&img, 2);
        for (x, y, p) in out.enumerate_pixels() {
            if (x, y) != (4, 4) {
                assert_eq!(p, &Rgb([10, 10, 10]), "pixel {x},{y}");
            }
        }
    }
}
