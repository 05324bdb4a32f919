use anyhow::Result;
use burn::data::dataset::Dataset;
use std::path::Path;

use crate::domain::image_entry::ImageEntry;
use crate::domain::traits::ImageSource;

/// Whether a dataset feeds optimisation or preview sampling.
/// Both read the same way; the split only changes how the
/// driver batches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetTask {
    Train,
    Test,
}

/// The image files of one data directory, in sorted order.
pub struct ImageDataset {
    entries: Vec<ImageEntry>,
    task:    DatasetTask,
}

impl ImageDataset {
    pub fn new(entries: Vec<ImageEntry>, task: DatasetTask) -> Self {
        Self { entries, task }
    }

    /// List `dir` through the given source.
    pub fn from_dir(source: &impl ImageSource, dir: &Path, task: DatasetTask) -> Result<Self> {
        let entries = source.list(dir)?;
        tracing::info!("{:?} set: {} images from '{}'", task, entries.len(), dir.display());
        Ok(Self::new(entries, task))
    }

    pub fn task(&self) -> DatasetTask { self.task }
}

impl Dataset<ImageEntry> for ImageDataset {
    fn get(&self, index: usize) -> Option<ImageEntry> {
        self.entries.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
