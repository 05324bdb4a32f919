// ============================================================
// Layer 4 — Epoch Sampler
// ============================================================
// Decides which dataset items go into which batch, epoch by epoch.
//
// Shuffling:
//   Each sampler owns its own StdRng seeded from the run seed,
//   and reshuffles the full index list (Fisher-Yates via
//   rand::seq::SliceRandom) at the start of every epoch. The
//   same seed therefore reproduces the same batch order for
//   every epoch of every run.
//
// Batching:
//   Shuffled indices are cut into consecutive groups of
//   `batch_size`; the last group may be smaller. A batch size of
//   zero is treated as one.
//
// Reference: rand crate documentation
//            Rust Book §8 (Vectors)

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::image_entry::ImageEntry;

/// Produces the per-epoch batch plan for one dataset.
pub struct EpochSampler {
    batch_size: usize,
    rng:        StdRng,
}

impl EpochSampler {
    /// A sampler that reshuffles every epoch from `seed`.
    pub fn shuffled(batch_size: usize, seed: u64) -> Self {
        Self { batch_size: batch_size.max(1), rng: StdRng::seed_from_u64(seed) }
    }

    pub fn batch_size(&self) -> usize { self.batch_size }

    /// Index groups for the next epoch. Advances the shuffle RNG.
    pub fn next_epoch(&mut self, len: usize) -> Vec<Vec<usize>> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(&mut self.rng);
        indices.chunks(self.batch_size).map(<[usize]>::to_vec).collect()
    }

    /// Entry groups for the next epoch of `dataset`.
    pub fn next_epoch_entries<D: Dataset<ImageEntry>>(&mut self, dataset: &D) -> Vec<Vec<ImageEntry>> {
        self.next_epoch(dataset.len())
            .into_iter()
            .map(|group| group.into_iter().filter_map(|i| dataset.get(i)).collect())
            .collect()
    }
}
