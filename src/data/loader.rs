// ============================================================
// Layer 4 — Image Loader
// ============================================================
// Lists the image files of a data directory and decodes single
// images into normalised RGB pixel buffers.
//
// Directory walk:
//   Sub-directories are walked recursively and every regular
//   file is treated as an image. The list is sorted by path so
//   dataset indices are stable across runs and platforms.
//   A missing directory is an error.
//
// Pixel layout:
//   Decoded pixels are converted to 8-bit RGB (grey and RGBA
//   inputs included), scaled to [0, 1] and stored channel-first
//   (CHW) to match the network's [N, 3, H, W] input.
//
// Reference: image crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::image_entry::ImageEntry;
use crate::domain::traits::ImageSource;

/// Lists image files below a directory.
pub struct DirImageSource;

impl ImageSource for DirImageSource {
    fn list(&self, dir: &Path) -> Result<Vec<ImageEntry>> {
        let mut paths = Vec::new();
        collect_files(dir, &mut paths)?;
        paths.sort();

        tracing::debug!("Found {} images under '{}'", paths.len(), dir.display());
        Ok(paths.into_iter().map(ImageEntry::from_path).collect())
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Cannot read image directory '{}'", dir.display()))?;

    for entry in entries {
        let entry = entry?;
        let path  = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// A decoded image: CHW pixels in [0, 1].
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width:  usize,
    pub height: usize,
    /// Length = 3 * height * width, channel-major
    pub pixels: Vec<f32>,
}

/// Decode one image file into a normalised RGB buffer.
pub fn decode_rgb(path: &Path) -> Result<DecodedImage> {
    let rgb = image::open(path)
        .with_context(|| format!("Cannot decode image '{}'", path.display()))?
        .to_rgb8();

    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    let plane = width * height;
    let mut pixels = vec![0.0f32; 3 * plane];

    for (x, y, px) in rgb.enumerate_pixels() {
        let offset = y as usize * width + x as usize;
        for c in 0..3 {
            pixels[c * plane + offset] = px[c] as f32 / 255.0;
        }
    }

    Ok(DecodedImage { width, height, pixels })
}
