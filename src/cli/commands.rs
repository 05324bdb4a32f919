// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Defines the flags accepted by the single `sci-train` entry point.
// The flag names keep their snake_case spelling (--batch_size,
// --gpu, ...) so existing launch scripts keep working.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - type conversion (string → usize, f64, bool, ...)
//
// No range validation happens here: a zero epoch count or a
// negative learning rate is accepted and simply yields a
// degenerate run.

use clap::{ArgAction, Args};
use crate::application::train_use_case::{TrainConfig, TEST_DATA_DIR, TRAIN_DATA_DIR};

/// All arguments for a training run.
/// Each field becomes a --flag on the command line.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Number of images processed together in one optimisation step
    #[arg(long = "batch_size", default_value_t = 1)]
    pub batch_size: usize,

    /// Use the GPU to train the model (pass `--cuda false` to request CPU).
    /// Training still requires an accelerator; `false` only logs a warning.
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub cuda: bool,

    /// Accelerator device id
    #[arg(long, default_value = "0")]
    pub gpu: String,

    /// Random seed for weight initialisation and shuffling
    #[arg(long, default_value_t = 2)]
    pub seed: u64,

    /// Number of full passes through the training images
    #[arg(long, default_value_t = 1000)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 3e-4)]
    pub lr: f64,

    /// Number of enhance/calibrate stages unrolled during training
    #[arg(long, default_value_t = 3)]
    pub stage: usize,

    /// Root directory for experiment output
    #[arg(long, default_value = "Exp/")]
    pub save: String,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The data directories are fixed and never come from the command line.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            batch_size: a.batch_size,
            cuda:       a.cuda,
            gpu:        a.gpu,
            seed:       a.seed,
            epochs:     a.epochs,
            lr:         a.lr,
            stage:      a.stage,
            save:       a.save,
            train_dir:  TRAIN_DATA_DIR.to_string(),
            test_dir:   TEST_DATA_DIR.to_string(),
        }
    }
}
