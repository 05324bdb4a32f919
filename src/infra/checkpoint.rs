// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's
// NamedMpkFileRecorder at full precision.
//
// One checkpoint is written per epoch and never read back during
// the run; every file is an independent snapshot, so a crashed
// run still leaves usable weights from its completed epochs.
//
// File naming convention:
//   model_epochs/
//     weights_0.mpk   ← weights after epoch 0
//     weights_1.mpk   ← weights after epoch 1
//     ...
//
// Loading is type-safe: a record only loads into a Network
// built with the same architecture (stage count, channels).
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{fs, path::PathBuf};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
};

use crate::ml::model::Network;

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Manages the per-epoch weight files of one run.
pub struct CheckpointManager {
    /// Directory where weight files are stored
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a manager, creating the directory if it doesn't exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Path of the weight file for `epoch`, extension included.
    pub fn weights_path(&self, epoch: usize) -> PathBuf {
        self.stem(epoch).with_extension(WEIGHTS_EXTENSION)
    }

    // The recorder appends the extension itself.
    fn stem(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("weights_{epoch}"))
    }

    /// Write the model's parameters for `epoch`. Returns the file written.
    pub fn save_model<B: Backend>(&self, model: &Network<B>, epoch: usize) -> Result<PathBuf> {
        WeightsRecorder::new()
            .record(model.clone().into_record(), self.stem(epoch))
            .map_err(|e| anyhow::anyhow!("Failed to save checkpoint for epoch {epoch}: {e:?}"))?;

        let path = self.weights_path(epoch);
        tracing::debug!("Saved checkpoint '{}'", path.display());
        Ok(path)
    }

    /// Load the weights of `epoch` into `model`.
    /// `model` must have the architecture the checkpoint was saved from.
    pub fn load_model<B: Backend>(
        &self,
        model:  Network<B>,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<Network<B>> {
        let record = WeightsRecorder::new()
            .load(self.stem(epoch), device)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Cannot load checkpoint '{}': {e:?}",
                    self.weights_path(epoch).display()
                )
            })?;
        Ok(model.load_record(record))
    }
}

const WEIGHTS_EXTENSION: &str = "mpk";
