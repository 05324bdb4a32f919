// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Handles the cross-cutting concerns of a run that don't belong
// in any specific business layer:
//
//   experiment.rs — Run directory layout (Train-<YYYYMMDD>/),
//                   source snapshot for provenance, config JSON
//
//   checkpoint.rs — Saving and loading model weights with
//                   Burn's named MessagePack recorder
//
//   preview.rs    — Writing rendered preview images as PNG
//
//   metrics.rs    — Per-epoch metrics appended to a CSV file
//
//   logging.rs    — tracing subscriber (console + log.txt) and
//                   the sink that renders training events
//
//   device.rs     — Accelerator discovery through wgpu
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Run directory creation and source snapshot
pub mod experiment;

/// Model checkpoint saving and loading
pub mod checkpoint;

/// PNG preview writer
pub mod preview;

/// Training metrics CSV logger
pub mod metrics;

/// Console/file logging and the tracing event sink
pub mod logging;

/// WGPU accelerator probe
pub mod device;
