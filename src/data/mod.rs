// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from image files on disk
// all the way to device-resident tensor batches.
//
// The pipeline flows in this order:
//
//   data directory
//       │
//       ▼
//   DirImageSource    → walks the directory, sorted file list
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   EpochSampler      → seeded shuffle, groups indices into batches
//       │
//       ▼
//   ImageBatcher      → decodes files, stacks them into [N, 3, H, W]
//
// Loading is synchronous with the training loop (no worker
// threads); a batch is decoded right before it is used.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Lists and decodes image files
pub mod loader;

/// Implements Burn's Dataset trait over image entries
pub mod dataset;

/// Decodes a group of entries into one tensor batch
pub mod batcher;

/// Seeded per-epoch shuffling and batching of dataset indices
pub mod sampler;
