// ============================================================
// Layer 3 — Training Events
// ============================================================
// Everything the training driver wants to report is expressed as
// one of these values and handed to an EventSink. The driver
// never formats log lines itself; sinks decide how an event is
// rendered (console/file log, CSV metrics, in-memory capture).

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    /// No accelerator matched the requested id; the run stops
    NoAccelerator,

    /// The accelerator was found and selected
    DeviceSelected { device: String },

    /// Resolved run configuration, rendered by the caller
    ConfigResolved { summary: String },

    /// The accelerator flag was off although a device exists
    AcceleratorFlagIgnored,

    /// Network built and initialised; size in millions of parameters
    ModelReady { params_millions: f64 },

    /// One optimisation step finished
    BatchCompleted { epoch: usize, batch: usize, loss: f64 },

    /// All training batches of an epoch finished.
    /// `mean_loss` is NaN when the epoch had no batches.
    EpochCompleted { epoch: usize, mean_loss: f64, steps: usize },

    /// Weights for an epoch were written to disk
    CheckpointSaved { epoch: usize, path: PathBuf },

    /// Preview rendering is about to start; `last_loss` is the
    /// most recent training loss of the run
    SamplingStarted { epoch: usize, last_loss: f64 },

    /// One preview image was written
    PreviewSaved { epoch: usize, path: PathBuf },
}
