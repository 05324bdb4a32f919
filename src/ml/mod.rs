// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn-specific numerics.
//
// What's in this layer:
//
//   model.rs      — The SCI network
//                   • EnhanceNetwork: estimates illumination
//                   • CalibrateNetwork: feeds a correction back
//                     into the next stage's input
//                   • explicit list of the six initialisable parts
//
//   loss.rs       — Self-supervised loss (fidelity + smoothness)
//                   computed from the input alone, no ground truth
//
//   clipping.rs   — Global gradient-norm clipping over all params
//
//   trainer.rs    — The epoch loop: forward, loss, backward,
//                   clip, Adam step, checkpoint, previews
//
//   inferencer.rs — Preview rendering with the evaluation-mode
//                   model (no autodiff, running BatchNorm stats)
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Ma et al. (2022) Toward Fast, Flexible, and Robust
//            Low-Light Image Enhancement

/// SCI network architecture
pub mod model;

/// Illumination fidelity + smoothness loss
pub mod loss;

/// Global-norm gradient clipping
pub mod clipping;

/// Full training loop with checkpointing and sampling
pub mod trainer;

/// Renders preview images with the evaluation-mode model
pub mod inferencer;

/// Backend used for training runs: autodiff over WGPU.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;
