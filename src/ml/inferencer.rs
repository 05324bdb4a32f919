// ============================================================
// Layer 5 — Preview Renderer
// ============================================================
// Runs the evaluation-mode network on one test image and turns
// the first-stage enhanced output into an 8-bit RGB image.
//
// Evaluation mode is a separate module value: the trainer hands
// over `model.valid()`, which lives on the inner (non-autodiff)
// backend, so no gradient graph is built and BatchNorm uses its
// running statistics.
//
// Pixel conversion follows the usual float → u8 cast:
// v * 255, clipped to [0, 255], truncated.

use anyhow::{Context, Result};
use burn::prelude::*;
use image::RgbImage;

use crate::ml::model::Network;

pub struct PreviewRenderer<B: Backend> {
    model: Network<B>,
}

impl<B: Backend> PreviewRenderer<B> {
    pub fn new(model: Network<B>) -> Self {
        Self { model }
    }

    /// images: [1, 3, H, W] → the first reflectance output as an image.
    pub fn render(&self, images: Tensor<B, 4>) -> Result<RgbImage> {
        let output = self.model.forward(images);
        let enhanced = output
            .reflectance
            .into_iter()
            .next()
            .context("Network produced no enhanced output (stage count is 0)")?;
        tensor_to_rgb8(enhanced)
    }
}

/// Convert the first image of a [N, 3, H, W] tensor to RGB8.
pub fn tensor_to_rgb8<B: Backend>(tensor: Tensor<B, 4>) -> Result<RgbImage> {
    let [_, channels, height, width] = tensor.dims();
    anyhow::ensure!(channels == 3, "Expected 3 channels, got {channels}");

    let first = tensor.slice([0..1, 0..3, 0..height, 0..width]);
    let values: Vec<f32> = first
        .into_data()
        .convert::<f32>()
        .to_vec()
        .map_err(|e| anyhow::anyhow!("Cannot read tensor data: {e:?}"))?;

    let plane = width * height;
    let mut raw = Vec::with_capacity(3 * plane);
    for offset in 0..plane {
        for c in 0..3 {
            raw.push((values[c * plane + offset] * 255.0).clamp(0.0, 255.0) as u8);
        }
    }

    RgbImage::from_raw(width as u32, height as u32, raw)
        .context("Pixel buffer does not match image dimensions")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::NetworkConfig;
    use crate::test_support::{backend_rng_guard, TestBackend};

    #[test]
    fn test_conversion_clips_and_truncates() {
        let device = Default::default();
        // 1x2 image: pixel 0 = (1.5, -0.2, 0.5), pixel 1 = (0.999, 0.0, 1.0)
        let data = TensorData::new(vec![1.5f32, 0.999, -0.2, 0.0, 0.5, 1.0], [1, 3, 1, 2]);
        let t = Tensor::<TestBackend, 4>::from_data(data, &device);

        let img = tensor_to_rgb8(t).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 127]);
        assert_eq!(img.get_pixel(1, 0).0, [254, 0, 255]);
    }

    #[test]
    fn test_render_uses_image_size() {
        let _guard = backend_rng_guard(12);
        let device = Default::default();
        let model = NetworkConfig::new().init::<TestBackend>(&device).init_weights(&device);
        let x = Tensor::<TestBackend, 4>::full([1, 3, 5, 7], 0.1, &device);

        let img = PreviewRenderer::new(model).render(x).unwrap();
        assert_eq!((img.width(), img.height()), (7, 5));
    }

    #[test]
    fn test_render_without_stages_is_an_error() {
        let _guard = backend_rng_guard(13);
        let device = Default::default();
        let model = NetworkConfig::new().with_stage(0).init::<TestBackend>(&device);
        let x = Tensor::<TestBackend, 4>::full([1, 3, 4, 4], 0.1, &device);
        assert!(PreviewRenderer::new(model).render(x).is_err());
    }
}
