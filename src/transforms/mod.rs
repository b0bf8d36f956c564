//! Transform registry: named in-place file transforms, registered statically and applied in a
//! fixed order.
//!
//! Every registered transform runs against every valid file, in descending name order, each
//! rewriting the file in place. Whether a transform should actually change a given file (and
//! what it does on failure) is the transform's own business; errors propagate to the worker,
//! where they are fatal.
//!
//! ```ignore
//! let registry = TransformRegistry::builder()
//!     .register(Resize::default())
//!     .register(MyWatermark::new("© me"))
//!     .build();
//! let applied = registry.apply_all(Path::new("incoming/cat.jpg"))?;
//! ```

pub mod polaroid;
pub mod resize;
pub mod smooth;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

pub use polaroid::Polaroid;
pub use resize::Resize;
pub use smooth::Smooth;

/// A named unit of in-place processing: transform the file at `path` and return the name applied.
pub trait Transform: Send + Sync {
    fn name(&self) -> &str;
    fn apply(&self, path: &Path) -> Result<String>;
}

/// Immutable after [`TransformRegistryBuilder::build`].
pub struct TransformRegistry {
    transforms: BTreeMap<String, Box<dyn Transform>>,
}

#[derive(Default)]
pub struct TransformRegistryBuilder {
    transforms: BTreeMap<String, Box<dyn Transform>>,
}

impl TransformRegistryBuilder {
    /// Add a transform. A later registration under the same name replaces the earlier one.
    pub fn register<T: Transform + 'static>(self, transform: T) -> Self {
        self.register_boxed(Box::new(transform))
    }

    pub fn register_boxed(mut self, transform: Box<dyn Transform>) -> Self {
        let name = transform.name().to_string();
        if self.transforms.insert(name.clone(), transform).is_some() {
            debug!("transform {} registered twice; keeping the later one", name);
        }
        self
    }

    pub fn build(self) -> TransformRegistry {
        TransformRegistry {
            transforms: self.transforms,
        }
    }
}

impl TransformRegistry {
    pub fn builder() -> TransformRegistryBuilder {
        TransformRegistryBuilder::default()
    }

    /// No transforms: valid files are moved to the accepted directory unchanged.
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// The built-in image transforms.
    pub fn builtin() -> Self {
        Self::builder()
            .register(Polaroid::default())
            .register(Resize::default())
            .register(Smooth::default())
            .build()
    }

    /// Names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.transforms.keys().rev().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Run every transform on `path`, in order, stopping at the first error.
    /// Returns the names the transforms reported.
    pub fn apply_all(&self, path: &Path) -> Result<Vec<String>> {
        self.transforms
            .values()
            .rev()
            .map(|transform| {
                debug!("{}: {}", transform.name(), path.display());
                transform
                    .apply(path)
                    .with_context(|| format!("transform {} failed", transform.name()))
            })
            .collect()
    }
}

/// Decode an image, sniffing the format from its content.
pub(crate) fn open_image(path: &Path) -> Result<DynamicImage> {
    ImageReader::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("read {}", path.display()))?
        .decode()
        .with_context(|| format!("decode {}", path.display()))
}

/// Encode `img` over `path` in the format implied by its extension. JPEG has no alpha channel,
/// so images are flattened to RGB first.
pub(crate) fn save_image(img: DynamicImage, path: &Path) -> Result<()> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let img = if is_jpeg {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        img
    };
    img.save(path)
        .with_context(|| format!("encode {}", path.display()))
}
