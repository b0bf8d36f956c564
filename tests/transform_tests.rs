use anyhow::{Result, bail};
use image::{Rgb, RgbImage};
use lightbox::transforms::{Polaroid, Resize, Smooth};
use lightbox::{Transform, TransformRegistry};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Appends its name to the file so the application order is visible in the content.
struct Marker(&'static str);

impl Transform for Marker {
    fn name(&self) -> &str {
        self.0
    }

    fn apply(&self, path: &Path) -> Result<String> {
        let mut content = fs::read_to_string(path)?;
        content.push_str(self.0);
        content.push(';');
        fs::write(path, content)?;
        Ok(self.0.to_string())
    }
}

struct Failing;

impl Transform for Failing {
    fn name(&self) -> &str {
        "m-failing"
    }

    fn apply(&self, _path: &Path) -> Result<String> {
        bail!("cannot process")
    }
}

struct Counting {
    name: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Transform for Counting {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, _path: &Path) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.name.to_string())
    }
}

fn write_test_image(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save(path).unwrap();
}

// --- registry ---

#[test]
fn test_names_in_descending_order() {
    let registry = TransformRegistry::builder()
        .register(Marker("alpha"))
        .register(Marker("gamma"))
        .register(Marker("beta"))
        .build();
    assert_eq!(registry.names(), vec!["gamma", "beta", "alpha"]);
    assert_eq!(registry.len(), 3);
}

#[test]
fn test_builtin_names() {
    let registry = TransformRegistry::builtin();
    assert_eq!(registry.names(), vec!["smooth", "resize", "polaroid"]);
}

#[test]
fn test_empty_registry_applies_nothing() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("a.jpg");
    fs::write(&path, "x")?;
    let registry = TransformRegistry::empty();
    assert!(registry.is_empty());
    assert!(registry.apply_all(&path)?.is_empty());
    assert_eq!(fs::read_to_string(&path)?, "x");
    Ok(())
}

#[test]
fn test_apply_all_order_is_deterministic() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let registry = TransformRegistry::builder()
        .register(Marker("a"))
        .register(Marker("c"))
        .register(Marker("b"))
        .build();
    for round in 0..3 {
        let path = tmp.path().join(format!("{round}.jpg"));
        fs::write(&path, "")?;
        let applied = registry.apply_all(&path)?;
        assert_eq!(applied, vec!["c", "b", "a"]);
        assert_eq!(fs::read_to_string(&path)?, "c;b;a;");
    }
    Ok(())
}

#[test]
fn test_duplicate_name_keeps_later() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("a.jpg");
    fs::write(&path, "")?;
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let registry = TransformRegistry::builder()
        .register(Counting {
            name: "dup",
            calls: Arc::clone(&first),
        })
        .register(Counting {
            name: "dup",
            calls: Arc::clone(&second),
        })
        .build();
    assert_eq!(registry.len(), 1);
    registry.apply_all(&path)?;
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn test_failing_transform_stops_the_chain() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("a.jpg");
    fs::write(&path, "")?;
    // Order: z, m-failing, a.
    let registry = TransformRegistry::builder()
        .register(Marker("a"))
        .register(Failing)
        .register(Marker("z"))
        .build();
    let err = registry.apply_all(&path).unwrap_err();
    assert!(format!("{err:#}").contains("m-failing"), "{err:#}");
    assert_eq!(fs::read_to_string(&path)?, "z;");
    Ok(())
}

// --- built-in image transforms ---

#[test]
fn test_resize_shrinks_large_jpeg() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("wide.jpg");
    write_test_image(&path, 1500, 600);
    assert_eq!(Resize::default().apply(&path)?, "resize");
    assert_eq!(image::image_dimensions(&path)?, (750, 300));
    Ok(())
}

#[test]
fn test_resize_leaves_small_image() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("small.png");
    write_test_image(&path, 40, 30);
    let before = fs::read(&path)?;
    Resize::default().apply(&path)?;
    assert_eq!(fs::read(&path)?, before);
    Ok(())
}

#[test]
fn test_polaroid_adds_frame() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("shot.png");
    write_test_image(&path, 100, 60);
    Polaroid::default().apply(&path)?;
    assert_eq!(image::image_dimensions(&path)?, (110, 85));
    Ok(())
}

#[test]
fn test_smooth_keeps_dimensions() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("shot.jpg");
    write_test_image(&path, 32, 24);
    Smooth::default().apply(&path)?;
    assert_eq!(image::image_dimensions(&path)?, (32, 24));
    Ok(())
}

#[test]
fn test_builtin_chain_on_jpeg() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("cat.jpg");
    write_test_image(&path, 1000, 500);
    let applied = TransformRegistry::builtin().apply_all(&path)?;
    assert_eq!(applied, vec!["smooth", "resize", "polaroid"]);
    // 750x375 after resize, then a 38px margin with a 4x bottom.
    let (w, h) = image::image_dimensions(&path)?;
    assert!(w > 750 && h > 375, "{w}x{h}");
    Ok(())
}

#[test]
fn test_non_image_fails() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("fake.jpg");
    fs::write(&path, "not an image")?;
    assert!(TransformRegistry::builtin().apply_all(&path).is_err());
    Ok(())
}
