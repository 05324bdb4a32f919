// ============================================================
// Layer 5 — Self-Supervised Loss
// ============================================================
// The network is trained without ground truth. For every stage,
// the estimated illumination is pulled towards the stage input
// (fidelity) while being kept piecewise smooth wherever the input
// itself is smooth (edge-aware smoothness):
//
//   stage_loss = 1.5 * MSE(illu, input) + smooth(input, illu)
//
// Smoothness term:
//   The input is converted to YCbCr. For each pixel pair at
//   distance ≤ 2 (24 directed neighbours, i.e. the 12 offsets
//   below counted in both directions), the illumination
//   difference |Δillu|₁ is weighted by
//       w = exp(-Σ_c (Δycc_c)² / (2σ²)),  σ = 10
//   so edges in the input relax the smoothness constraint.
//   The term is the sum of the per-offset means. An offset that
//   does not fit inside the image (H or W below 3) adds nothing.

use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};

const FIDELITY_WEIGHT: f64 = 1.5;
const SMOOTH_SIGMA: f64 = 10.0;

/// Neighbour offsets (dy, dx) with dy ≥ 0; each is also counted mirrored.
const NEIGHBOUR_OFFSETS: [(usize, isize); 12] = [
    (1, 0), (0, 1), (1, 1), (1, -1),
    (2, 0), (0, 2), (2, 1), (2, -1),
    (1, 2), (1, -2), (2, 2), (2, -2),
];

/// Loss for one stage. Both tensors: [batch, 3, H, W].
pub fn stage_loss<B: Backend>(input: Tensor<B, 4>, illu: Tensor<B, 4>) -> Tensor<B, 1> {
    let fidelity = MseLoss::new().forward(illu.clone(), input.clone(), Reduction::Mean);
    fidelity.mul_scalar(FIDELITY_WEIGHT) + smooth_loss(input, illu)
}

/// Edge-aware smoothness of `illu`, guided by `input`.
pub fn smooth_loss<B: Backend>(input: Tensor<B, 4>, illu: Tensor<B, 4>) -> Tensor<B, 1> {
    let [_, _, h, w] = illu.dims();
    let guide = rgb_to_ycbcr(input);
    let sigma_color = -1.0 / (2.0 * SMOOTH_SIGMA * SMOOTH_SIGMA);

    let terms = NEIGHBOUR_OFFSETS
        .iter()
        .filter(|(dy, dx)| *dy < h && dx.unsigned_abs() < w)
        .map(|&(dy, dx)| {
            let (ga, gb) = offset_pair(&guide, dy, dx);
            let (ia, ib) = offset_pair(&illu, dy, dx);

            let weight = (ga - gb)
                .powf_scalar(2.0)
                .sum_dim(1)
                .mul_scalar(sigma_color)
                .exp();
            let grad = (ia - ib).abs().sum_dim(1);
            (weight * grad).mean()
        });

    let device = illu.device();
    terms
        .fold(Tensor::zeros([1], &device), |acc, t| acc + t)
        // a→b and b→a give identical terms
        .mul_scalar(2.0)
}

/// The two overlapping windows of `t` that are `(dy, dx)` pixels apart.
/// Requires `dy < H` and `|dx| < W`.
fn offset_pair<B: Backend>(t: &Tensor<B, 4>, dy: usize, dx: isize) -> (Tensor<B, 4>, Tensor<B, 4>) {
    let [n, c, h, w] = t.dims();
    let ax = dx.unsigned_abs();
    let (cols_a, cols_b) = if dx >= 0 {
        (ax..w, 0..w - ax)
    } else {
        (0..w - ax, ax..w)
    };
    let a = t.clone().slice([0..n, 0..c, dy..h, cols_a]);
    let b = t.clone().slice([0..n, 0..c, 0..h - dy, cols_b]);
    (a, b)
}

/// BT.601 studio-swing RGB → YCbCr, values stay in [0, 1] scale.
pub fn rgb_to_ycbcr<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [n, _, h, w] = x.dims();
    let channel = |i: usize| x.clone().slice([0..n, i..i + 1, 0..h, 0..w]);
    let (r, g, b) = (channel(0), channel(1), channel(2));

    let mix = |kr: f64, kg: f64, kb: f64, offset: f64| {
        (r.clone().mul_scalar(kr) + g.clone().mul_scalar(kg) + b.clone().mul_scalar(kb))
            .add_scalar(offset)
    };

    let y  = mix(0.257, 0.564, 0.098, 16.0 / 255.0);
    let cb = mix(-0.148, -0.291, 0.439, 128.0 / 255.0);
    let cr = mix(0.439, -0.368, -0.071, 128.0 / 255.0);

    Tensor::cat(vec![y, cb, cr], 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{backend_rng_guard, TestBackend};
    use burn::tensor::Distribution;

    fn scalar(t: Tensor<TestBackend, 1>) -> f64 {
        t.into_scalar().elem::<f64>()
    }

    #[test]
    fn test_black_maps_to_studio_offsets() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::zeros([1, 3, 2, 2], &device);
        let v: Vec<f32> = rgb_to_ycbcr(x).into_data().convert::<f32>().to_vec().unwrap();
        assert!((v[0] - 16.0 / 255.0).abs() < 1e-6);
        assert!((v[4] - 128.0 / 255.0).abs() < 1e-6);
        assert!((v[8] - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_constant_illumination_is_perfectly_smooth() {
        let _guard = backend_rng_guard(0);
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::random([1, 3, 6, 6], Distribution::Uniform(0.0, 1.0), &device);
        let illu  = Tensor::<TestBackend, 4>::full([1, 3, 6, 6], 0.4, &device);
        assert!(scalar(smooth_loss(input, illu)).abs() < 1e-9);
    }

    #[test]
    fn test_fidelity_vanishes_when_illumination_matches_input() {
        let device = Default::default();
        let x = Tensor::<TestBackend, 4>::full([1, 3, 5, 5], 0.25, &device);
        // Constant and equal: both terms are zero
        assert!(scalar(stage_loss(x.clone(), x)).abs() < 1e-9);
    }

    #[test]
    fn test_rough_illumination_costs_more_on_flat_input() {
        let _guard = backend_rng_guard(1);
        let device = Default::default();
        let flat  = Tensor::<TestBackend, 4>::full([1, 3, 6, 6], 0.1, &device);
        let rough = Tensor::<TestBackend, 4>::random([1, 3, 6, 6], Distribution::Uniform(0.0, 1.0), &device);
        let smooth = Tensor::<TestBackend, 4>::full([1, 3, 6, 6], 0.5, &device);
        assert!(scalar(smooth_loss(flat.clone(), rough)) > scalar(smooth_loss(flat, smooth)));
    }

    #[test]
    fn test_tiny_images_give_finite_loss() {
        let _guard = backend_rng_guard(2);
        let device = Default::default();
        for shape in [[1, 3, 2, 2], [1, 3, 1, 8], [2, 3, 8, 1]] {
            let input = Tensor::<TestBackend, 4>::random(shape, Distribution::Uniform(0.0, 1.0), &device);
            let illu  = Tensor::<TestBackend, 4>::random(shape, Distribution::Uniform(0.1, 1.0), &device);
            let loss = scalar(stage_loss(input, illu));
            assert!(loss.is_finite(), "loss for {shape:?} was {loss}");
        }
    }

    #[test]
    fn test_single_pixel_has_no_neighbours() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::full([1, 3, 1, 1], 0.2, &device);
        let illu  = Tensor::<TestBackend, 4>::full([1, 3, 1, 1], 0.9, &device);
        assert_eq!(scalar(smooth_loss(input, illu)), 0.0);
    }

    #[test]
    fn test_offset_pair_shapes() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 4>::zeros([2, 3, 7, 9], &device);
        let (a, b) = offset_pair(&t, 2, -1);
        assert_eq!(a.dims(), [2, 3, 5, 8]);
        assert_eq!(b.dims(), [2, 3, 5, 8]);
    }

    #[test]
    fn test_offset_pair_aligns_neighbours() {
        let device = Default::default();
        // Column index as value: a - b must equal dx everywhere
        let row = Tensor::<TestBackend, 1>::from_floats([0.0, 1.0, 2.0, 3.0], &device);
        let t = row.reshape([1, 1, 1, 4]).repeat_dim(2, 3);
        let (a, b) = offset_pair(&t, 1, -2);
        let diff: Vec<f32> = (a - b).into_data().convert::<f32>().to_vec().unwrap();
        assert!(diff.iter().all(|&d| (d + 2.0).abs() < 1e-6));
    }
}
