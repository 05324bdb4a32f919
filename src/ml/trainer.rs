// ============================================================
// Layer 5 — Training Loop
// ============================================================
// The epoch loop for the SCI network.
//
// Per epoch:
//   1. every training batch: forward → loss → backward →
//      clip global grad norm to 5 → Adam step
//   2. report the mean loss (NaN for an epoch without batches)
//   3. save weights_<epoch>
//   4. once at least one step has run in the whole run, render
//      one preview per test image with the evaluation-mode model
//
// Key Burn insights:
//   - Training uses B (an AutodiffBackend) for gradients
//   - model.valid() returns the model on B::InnerBackend, so the
//     preview batcher is built for the inner backend as well
//   - Burn's optimiser-level clipping is per parameter; the global
//     norm is handled by ml::clipping before the step
//
// Everything observable is reported through an EventSink; this
// module never formats log lines itself.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::Result;
use burn::{
    data::dataset::Dataset,
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::ImageBatcher, dataset::ImageDataset, sampler::EpochSampler};
use crate::domain::{events::TrainingEvent, traits::EventSink};
use crate::infra::{checkpoint::CheckpointManager, preview::PreviewWriter};
use crate::ml::{
    clipping::clip_grad_norm,
    inferencer::PreviewRenderer,
    model::{Network, NetworkConfig},
};

/// Upper bound for the global L2 norm of all gradients.
pub const GRAD_CLIP_NORM: f64 = 5.0;

const ADAM_BETA_1: f32 = 0.9;
const ADAM_BETA_2: f32 = 0.999;
const WEIGHT_DECAY: f32 = 3e-4;

/// Training and preview images for a run.
pub struct TrainingData {
    pub train: ImageDataset,
    pub test:  ImageDataset,
}

/// Where the loop writes its artifacts.
pub struct TrainingOutputs<'a> {
    pub checkpoints: &'a CheckpointManager,
    pub previews:    &'a PreviewWriter,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSummary {
    pub epochs:      usize,
    pub total_steps: usize,
    /// Loss of the final optimisation step, if any step ran
    pub last_loss:   Option<f64>,
}

/// Adam with betas (0.9, 0.999) and L2 weight decay 3e-4.
pub fn adam_config() -> AdamConfig {
    AdamConfig::new()
        .with_beta_1(ADAM_BETA_1)
        .with_beta_2(ADAM_BETA_2)
        .with_epsilon(1e-8)
        .with_weight_decay(Some(WeightDecayConfig::new(WEIGHT_DECAY)))
}

/// Build, train and checkpoint a network on `device`.
///
/// The backend RNG is seeded before the network is built, and the
/// shuffle order of both datasets derives from the same seed, so two
/// runs with equal config and data take identical steps.
pub fn run_training<B, S>(
    cfg:     &TrainConfig,
    device:  &B::Device,
    data:    TrainingData,
    outputs: TrainingOutputs<'_>,
    sink:    &S,
) -> Result<TrainingSummary>
where
    B: AutodiffBackend,
    S: EventSink + ?Sized,
{
    B::seed(cfg.seed);

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Network<B> = NetworkConfig::new()
        .with_stage(cfg.stage)
        .init(device)
        .init_weights(device);
    sink.record(&TrainingEvent::ModelReady {
        params_millions: model.num_params() as f64 / 1e6,
    })?;

    let mut optim = adam_config().init();

    // ── Data ──────────────────────────────────────────────────────────────────
    let mut train_sampler = EpochSampler::shuffled(cfg.batch_size, cfg.seed);
    let mut test_sampler  = EpochSampler::shuffled(1, cfg.seed.wrapping_add(1));
    let train_batcher = ImageBatcher::<B>::new(device.clone());
    let test_batcher  = ImageBatcher::<B::InnerBackend>::new(device.clone());
    for (set, sampler) in [(&data.train, &train_sampler), (&data.test, &test_sampler)] {
        tracing::debug!(
            "{:?} loader: {} images, batch size {}",
            set.task(),
            set.len(),
            sampler.batch_size()
        );
    }

    let mut total_steps = 0usize;
    let mut last_loss: Option<f64> = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 0..cfg.epochs {
        let mut losses = Vec::new();

        for (batch_idx, entries) in train_sampler.next_epoch_entries(&data.train).into_iter().enumerate() {
            let batch = train_batcher.batch(entries)?;
            let loss = model.forward_loss(batch.images);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

            let mut grads = GradientsParams::from_grads(loss.backward(), &model);
            clip_grad_norm::<B, _>(&model, &mut grads, GRAD_CLIP_NORM);
            model = optim.step(cfg.lr, model, grads);

            total_steps += 1;
            losses.push(loss_val);
            last_loss = Some(loss_val);
            sink.record(&TrainingEvent::BatchCompleted { epoch, batch: batch_idx, loss: loss_val })?;
        }

        sink.record(&TrainingEvent::EpochCompleted {
            epoch,
            mean_loss: mean(&losses),
            steps: losses.len(),
        })?;

        let path = outputs.checkpoints.save_model(&model, epoch)?;
        sink.record(&TrainingEvent::CheckpointSaved { epoch, path })?;

        // ── Previews ──────────────────────────────────────────────────────────
        let Some(loss) = last_loss else { continue };
        sink.record(&TrainingEvent::SamplingStarted { epoch, last_loss: loss })?;

        let renderer = PreviewRenderer::new(model.valid());
        for entries in test_sampler.next_epoch_entries(&data.test) {
            let batch = test_batcher.batch(entries)?;
            let image = renderer.render(batch.images)?;
            // Test batches hold exactly one image
            let Some(entry) = batch.entries.first() else { continue };
            let path = outputs.previews.save(entry.stem(), epoch, &image)?;
            sink.record(&TrainingEvent::PreviewSaved { epoch, path })?;
        }
    }

    Ok(TrainingSummary { epochs: cfg.epochs, total_steps, last_loss })
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
