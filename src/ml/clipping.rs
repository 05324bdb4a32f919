// ============================================================
// Layer 5 — Global Gradient-Norm Clipping
// ============================================================
// Burn's optimizer-level clipping works one parameter tensor at
// a time. Training here bounds the norm of ALL gradients taken
// together, so clipping is done on the GradientsParams before
// the optimizer sees them:
//
//   total = sqrt(Σ_p ‖g_p‖²)
//   if total > max_norm:  g_p ← g_p · max_norm / (total + 1e-6)
//
// Two passes over the module: one ModuleVisitor accumulates the
// squared norm, a second rescales every gradient in place.
//
// Reference: Pascanu et al. (2013) On the difficulty of training RNNs
//            Burn Book §5 (Custom Training Loop)

use burn::{
    module::{Module, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

const CLIP_EPSILON: f64 = 1e-6;

/// Global L2 norm of the gradients of every float parameter of `module`.
pub fn global_grad_norm<B: AutodiffBackend, M: Module<B>>(module: &M, grads: &GradientsParams) -> f64 {
    let mut visitor = SquaredNorm::<B> { grads, sum: 0.0, _backend: Default::default() };
    module.visit(&mut visitor);
    visitor.sum.sqrt()
}

/// Rescale `grads` so their global norm is at most `max_norm`.
/// Returns the norm measured before clipping.
pub fn clip_grad_norm<B: AutodiffBackend, M: Module<B>>(
    module:   &M,
    grads:    &mut GradientsParams,
    max_norm: f64,
) -> f64 {
    let total = global_grad_norm::<B, M>(module, grads);
    let coef  = max_norm / (total + CLIP_EPSILON);
    if coef < 1.0 {
        let mut visitor = Rescale::<B> { grads, coef, _backend: Default::default() };
        module.visit(&mut visitor);
    }
    total
}

struct SquaredNorm<'a, B: AutodiffBackend> {
    grads:    &'a GradientsParams,
    sum:      f64,
    _backend: core::marker::PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.sum += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale<'a, B: AutodiffBackend> {
    grads:    &'a mut GradientsParams,
    coef:     f64,
    _backend: core::marker::PhantomData<B>,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_, B> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register::<B::InnerBackend, D>(id, grad.mul_scalar(self.coef));
        }
    }
}
