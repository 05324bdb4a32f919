// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Converts a Vec<ImageEntry> into one device tensor.
//
// How batching works here:
//   Input:  N entries, each an image file of size H x W
//   Output: ImageBatch with images of shape [N, 3, H, W]
//
//   Every file is decoded into a CHW buffer, the buffers are
//   concatenated and the flat Vec is handed to Burn with the
//   4-D shape:
//   [img1_c0 ..., img1_c1 ..., img1_c2 ..., img2_c0 ...] → [N, 3, H, W]
//
// Images are not resized or cropped, so every image inside one
// batch must have the same size. A mismatch is reported as an
// error naming the offending file.
//
// Decoding can fail, so unlike Burn's Batcher trait this batcher
// returns a Result and the training loop propagates the error.
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{bail, Result};
use burn::prelude::*;

use crate::data::loader::decode_rgb;
use crate::domain::image_entry::ImageEntry;

/// A batch of images ready for the network forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel values in [0, 1] — shape: [batch_size, 3, height, width]
    pub images: Tensor<B, 4>,

    /// The entries the batch was built from, in batch order.
    /// Training ignores them; sampling names previews after them.
    pub entries: Vec<ImageEntry>,
}

/// Holds the target device so tensors are created on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Decode `entries` and stack them into a single tensor.
    pub fn batch(&self, entries: Vec<ImageEntry>) -> Result<ImageBatch<B>> {
        let Some(first) = entries.first() else {
            bail!("Cannot build a batch from zero images");
        };

        let first_img = decode_rgb(&first.path)?;
        let (width, height) = (first_img.width, first_img.height);
        let mut flat = Vec::with_capacity(entries.len() * first_img.pixels.len());
        flat.extend_from_slice(&first_img.pixels);

        for entry in &entries[1..] {
            let img = decode_rgb(&entry.path)?;
            if (img.width, img.height) != (width, height) {
                bail!(
                    "Image '{}' is {}x{} but the batch started with {}x{}; \
                     images in one batch must share a size",
                    entry.path.display(), img.width, img.height, width, height
                );
            }
            flat.extend_from_slice(&img.pixels);
        }

        let data   = TensorData::new(flat, [entries.len(), 3, height, width]);
        let images = Tensor::<B, 4>::from_data(data, &self.device);

        Ok(ImageBatch { images, entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_png, TestBackend};

    #[test]
    fn test_batch_shape_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 5, 4, [0, 0, 0]);
        write_png(&b, 5, 4, [255, 255, 255]);

        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let batch = batcher
            .batch(vec![ImageEntry::from_path(&b), ImageEntry::from_path(&a)])
            .unwrap();

        assert_eq!(batch.images.dims(), [2, 3, 4, 5]);
        assert_eq!(batch.entries[0].name, "b.png");

        let values: Vec<f32> = batch.images.into_data().convert::<f32>().to_vec().unwrap();
        let per_image = 3 * 4 * 5;
        assert!(values[..per_image].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(values[per_image..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_mismatched_sizes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        write_png(&a, 4, 4, [0, 0, 0]);
        write_png(&b, 6, 4, [0, 0, 0]);

        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        let err = batcher
            .batch(vec![ImageEntry::from_path(&a), ImageEntry::from_path(&b)])
            .unwrap_err();
        assert!(err.to_string().contains("b.png"));
    }

    #[test]
    fn test_empty_batch_is_rejected() {
        let batcher = ImageBatcher::<TestBackend>::new(Default::default());
        assert!(batcher.batch(Vec::new()).is_err());
    }
}
