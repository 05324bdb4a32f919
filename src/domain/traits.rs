// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// the training driver can be exercised without a GPU and
// without a global logger:
//   - WgpuProbe implements AcceleratorProbe for real runs;
//     tests supply a probe that returns a CPU device or nothing
//   - TracingSink / MetricsLogger implement EventSink;
//     tests collect events into memory instead
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::events::TrainingEvent;
use crate::domain::image_entry::ImageEntry;

// ─── AcceleratorProbe ─────────────────────────────────────────────────────────
/// Finds the compute device a run should use.
pub trait AcceleratorProbe {
    /// The backend device handle this probe produces
    type Device;

    /// Resolve the device with the given id.
    /// Returns Ok(None) when no accelerator is available.
    fn select(&self, id: &str) -> Result<Option<Self::Device>>;
}

// ─── EventSink ────────────────────────────────────────────────────────────────
/// Consumes structured events emitted by the training driver.
pub trait EventSink {
    fn record(&self, event: &TrainingEvent) -> Result<()>;
}

/// Fan an event out to several sinks, in order.
impl EventSink for [&dyn EventSink] {
    fn record(&self, event: &TrainingEvent) -> Result<()> {
        for sink in self {
            sink.record(event)?;
        }
        Ok(())
    }
}

// ─── ImageSource ──────────────────────────────────────────────────────────────
/// Any component that can list the images of a data directory.
pub trait ImageSource {
    fn list(&self, dir: &Path) -> Result<Vec<ImageEntry>>;
}
