// ============================================================
// Layer 6 — Preview Writer
// ============================================================
// Stores the enhanced test images produced at the end of every
// epoch as PNG files named `<stem>_<epoch>.png`.

use anyhow::{Context, Result};
use image::{ImageFormat, RgbImage};
use std::path::PathBuf;

pub struct PreviewWriter {
    dir: PathBuf,
}

impl PreviewWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, stem: &str, epoch: usize) -> PathBuf {
        self.dir.join(format!("{stem}_{epoch}.png"))
    }

    pub fn save(&self, stem: &str, epoch: usize, image: &RgbImage) -> Result<PathBuf> {
        let path = self.path_for(stem, epoch);
        image
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("Cannot write preview '{}'", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_name_carries_stem_and_epoch() {
        let writer = PreviewWriter::new("out");
        assert_eq!(writer.path_for("img01", 7), PathBuf::from("out/img01_7.png"));
    }

    #[test]
    fn test_saved_preview_is_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PreviewWriter::new(dir.path());
        let img = RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]));
        let path = writer.save("night", 0, &img).unwrap();

        let back = image::open(&path).unwrap().to_rgb8();
        assert_eq!(back.dimensions(), (4, 3));
        assert_eq!(back.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PreviewWriter::new(dir.path().join("absent"));
        let img = RgbImage::new(2, 2);
        assert!(writer.save("x", 0, &img).is_err());
    }
}
