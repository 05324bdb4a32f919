// ============================================================
// Layer 3 — ImageEntry Domain Type
// ============================================================
// Represents a single image file found in a data directory.
// The pixels are not loaded here: decoding happens lazily in
// the batcher, one batch at a time, so the whole dataset never
// has to sit in memory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// An image file and the name it is reported under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    /// Full path to the file on disk
    pub path: PathBuf,

    /// The file name (with extension). Used as the placeholder
    /// label for training items and to name preview images.
    pub name: String,
}

impl ImageEntry {
    /// Build an entry from a path; the name is the final path component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        Self { path, name }
    }

    /// File name without its extension, e.g. "night_01" for "night_01.jpg".
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.name)
    }
}
