//! Rasterizing a module grid and writing it out as PNG.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use tempfile::NamedTempFile;
use tracing::info;

use crate::color::Color;
use crate::error::QrError;
use crate::symbol::ModuleGrid;

// 16384 x 16384, about 800 MB of RGB data
const MAX_PIXELS: u64 = 1 << 28;

/// Draw `grid` with a quiet zone of `border` modules on every side, each
/// module `module_size` pixels square.
///
/// The image is exactly `(grid.size() + 2 * border) * module_size` pixels on
/// each side. Dark modules are drawn in `fill`, everything else, including the
/// quiet zone, in `background`. Images above 2^28 pixels are refused.
pub fn render(
    grid: &ModuleGrid,
    border: u32,
    module_size: u32,
    fill: Color,
    background: Color,
) -> Result<RgbImage, QrError> {
    if module_size == 0 {
        return Err(QrError::invalid_input("module size must be at least one pixel"));
    }
    let side = border
        .checked_mul(2)
        .and_then(|quiet| quiet.checked_add(grid.size()))
        .and_then(|modules| modules.checked_mul(module_size))
        .ok_or_else(|| QrError::invalid_input("border and module size give an image too large to address"))?;
    if u64::from(side) * u64::from(side) > MAX_PIXELS {
        return Err(QrError::invalid_input(format!(
            "a {side}x{side} pixel image exceeds the limit of {MAX_PIXELS} pixels"
        )));
    }

    let fill = fill.to_rgb();
    let background = background.to_rgb();
    Ok(RgbImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / module_size, y / module_size);
        // the quiet zone lies left/above of `border`; right/below it falls
        // outside the grid, which reads light
        if mx >= border && my >= border && grid.is_dark(mx - border, my - border) {
            fill
        } else {
            background
        }
    }))
}

/// Write `image` as an RGB PNG to `path` and return the absolute path of the
/// file.
///
/// The PNG is encoded into a temporary file next to `path` and moved into
/// place once complete, so a failed write never leaves a partial file behind.
pub fn save_png(image: &RgbImage, path: &Path) -> Result<PathBuf, QrError> {
    write_atomically(path, |file| {
        let mut out = BufWriter::new(file);
        image.write_to(&mut out, ImageFormat::Png)?;
        out.flush()?;
        Ok(())
    })?;
    let absolute = std::path::absolute(path)?;
    info!(path = %absolute.display(), width = image.width(), "wrote QR code image");
    Ok(absolute)
}

/// Run `write` against a fresh temporary file in the directory of `path`, then
/// rename it to `path`. On error the temporary file is removed.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), QrError>
where
    F: FnOnce(&mut NamedTempFile) -> Result<(), QrError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    // NamedTempFile creates files with mode 0600
    let mut permissions = file.as_file().metadata()?.permissions();
    set_default_mode(&mut permissions);
    file.as_file().set_permissions(permissions)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_default_mode(permissions: &mut fs::Permissions) {
    use std::os::unix::fs::PermissionsExt;
    permissions.set_mode(0o644);
}

#[cfg(not(unix))]
fn set_default_mode(_permissions: &mut fs::Permissions) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ECCLevel, Version};
    use crate::symbol::encode;

    fn grid() -> ModuleGrid {
        encode(b"render me", Version::new(1).unwrap(), ECCLevel::L).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let grid = grid();
        let image = render(&grid, 4, 10, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(image.dimensions(), (290, 290));
        let image = render(&grid, 0, 1, Color::BLACK, Color::WHITE).unwrap();
        assert_eq!(image.dimensions(), (21, 21));
    }

    #[test]
    fn test_pixels_follow_modules() {
        let grid = grid();
        let fill = Color::new(10, 20, 30);
        let background = Color::new(200, 210, 220);
        let image = render(&grid, 2, 3, fill, background).unwrap();

        // quiet zone
        assert_eq!(*image.get_pixel(0, 0), background.to_rgb());
        assert_eq!(*image.get_pixel(5, 5), background.to_rgb());
        assert_eq!(*image.get_pixel(image.width() - 1, image.height() - 1), background.to_rgb());
        // top left finder corner starts right after the border
        assert_eq!(*image.get_pixel(6, 6), fill.to_rgb());
        assert_eq!(*image.get_pixel(8, 8), fill.to_rgb());

        for my in 0..grid.size() {
            for mx in 0..grid.size() {
                let expected = if grid.is_dark(mx, my) { fill } else { background };
                assert_eq!(*image.get_pixel((mx + 2) * 3 + 1, (my + 2) * 3 + 1), expected.to_rgb());
            }
        }
    }

    #[test]
    fn test_invalid_module_size() {
        assert!(matches!(render(&grid(), 4, 0, Color::BLACK, Color::WHITE), Err(QrError::InvalidInput(_))));
        assert!(matches!(render(&grid(), u32::MAX, 1, Color::BLACK, Color::WHITE), Err(QrError::InvalidInput(_))));
    }

    #[test]
    fn test_too_many_pixels() {
        // the side still fits a u32, the pixel buffer would not
        let result = render(&grid(), 0, 200_000_000, Color::BLACK, Color::WHITE);
        assert!(matches!(result, Err(QrError::InvalidInput(_))));
        let result = render(&grid(), 0, 16384 / 21 + 1, Color::BLACK, Color::WHITE);
        assert!(matches!(result, Err(QrError::InvalidInput(_))));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let image = render(&grid(), 1, 2, Color::BLACK, Color::WHITE).unwrap();
        let path = save_png(&image, &dir.path().join("symbol.png")).unwrap();
        assert!(path.is_absolute());

        let reloaded = image::open(&path).unwrap();
        assert_eq!(reloaded.color(), image::ColorType::Rgb8);
        assert_eq!(reloaded.to_rgb8(), image);
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbol.png");
        let result = write_atomically(&path, |file| {
            file.write_all(b"\x89PNG partial")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "File too large").into())
        });
        assert!(matches!(result, Err(QrError::Io(_))));
        assert!(!path.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbol.png");
        fs::write(&path, b"stale").unwrap();
        let image = render(&grid(), 0, 1, Color::BLACK, Color::WHITE).unwrap();
        save_png(&image, &path).unwrap();
        assert_eq!(image::open(&path).unwrap().to_rgb8(), image);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let image = render(&grid(), 1, 1, Color::BLACK, Color::WHITE).unwrap();
        let result = save_png(&image, &dir.path().join("missing").join("symbol.png"));
        assert!(matches!(result, Err(QrError::Io(_))));
    }
}
