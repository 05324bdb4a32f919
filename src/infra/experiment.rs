// ============================================================
// Layer 6 — Experiment Directory
// ============================================================
// Every run writes into a dated directory under the output root:
//
//   <save>/Train-<YYYYMMDD>/
//     log.txt             ← console log mirror
//     train_config.json   ← resolved run configuration
//     metrics.csv         ← per-epoch metrics
//     model_epochs/       ← weights_<epoch>.mpk
//     image_epochs/       ← <stem>_<epoch>.png
//     scripts/            ← copy of the sources that produced the run
//
// Runs started on the same day share the directory. Existing files
// are overwritten, log.txt and metrics.csv are appended to.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Paths of one run directory. All directories exist once created.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub root:        PathBuf,
    pub model_dir:   PathBuf,
    pub image_dir:   PathBuf,
    pub scripts_dir: PathBuf,
    pub log_file:    PathBuf,
}

impl RunLayout {
    /// Create the run directory for `date` under `save_root` and snapshot
    /// the sources found under `source_root`.
    pub fn create(save_root: &Path, date: NaiveDate, source_root: &Path) -> Result<Self> {
        let root = save_root.join(run_dir_name(date));
        let layout = Self {
            model_dir:   root.join("model_epochs"),
            image_dir:   root.join("image_epochs"),
            scripts_dir: root.join("scripts"),
            log_file:    root.join("log.txt"),
            root,
        };

        for dir in [&layout.model_dir, &layout.image_dir, &layout.scripts_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create run directory '{}'", dir.display()))?;
        }

        let copied = snapshot_sources(source_root, &layout.scripts_dir)?;
        tracing::debug!("Snapshot of {copied} source files in '{}'", layout.scripts_dir.display());
        Ok(layout)
    }

    /// Write `config` as pretty JSON to `train_config.json`.
    pub fn save_config<T: Serialize>(&self, config: &T) -> Result<PathBuf> {
        let path = self.root.join("train_config.json");
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        Ok(path)
    }
}

/// `Train-YYYYMMDD`
pub fn run_dir_name(date: NaiveDate) -> String {
    format!("Train-{}", date.format("%Y%m%d"))
}

/// Copy `Cargo.toml` and every `.rs` file under `src/` into `dest`,
/// keeping relative paths. Missing sources are skipped, since an
/// installed binary may run far from its source tree.
fn snapshot_sources(source_root: &Path, dest: &Path) -> Result<usize> {
    let mut files = Vec::new();
    let manifest = source_root.join("Cargo.toml");
    if manifest.is_file() {
        files.push(manifest);
    }
    let src = source_root.join("src");
    if src.is_dir() {
        collect_rust_files(&src, &mut files)?;
    }

    for file in &files {
        let relative = file.strip_prefix(source_root).unwrap_or(file);
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(file, &target)
            .with_context(|| format!("Cannot copy '{}' into the run snapshot", file.display()))?;
    }
    Ok(files.len())
}

fn collect_rust_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot read '{}'", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            collect_rust_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_run_dir_is_named_after_the_date() {
        assert_eq!(run_dir_name(date()), "Train-20240309");
    }

    #[test]
    fn test_create_builds_layout_and_snapshot() {
        let sources = tempfile::tempdir().unwrap();
        fs::write(sources.path().join("Cargo.toml"), "[package]").unwrap();
        fs::create_dir_all(sources.path().join("src/ml")).unwrap();
        fs::write(sources.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(sources.path().join("src/ml/model.rs"), "").unwrap();
        fs::write(sources.path().join("src/notes.txt"), "skip").unwrap();

        let out = tempfile::tempdir().unwrap();
        let layout = RunLayout::create(&out.path().join("Exp"), date(), sources.path()).unwrap();

        assert_eq!(layout.root, out.path().join("Exp/Train-20240309"));
        assert!(layout.model_dir.is_dir());
        assert!(layout.image_dir.is_dir());
        assert!(layout.scripts_dir.join("Cargo.toml").is_file());
        assert!(layout.scripts_dir.join("src/main.rs").is_file());
        assert!(layout.scripts_dir.join("src/ml/model.rs").is_file());
        assert!(!layout.scripts_dir.join("src/notes.txt").exists());
    }

    #[test]
    fn test_same_day_runs_reuse_the_directory() {
        let sources = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let first = RunLayout::create(out.path(), date(), sources.path()).unwrap();
        let second = RunLayout::create(out.path(), date(), sources.path()).unwrap();
        assert_eq!(first.root, second.root);
    }

    #[test]
    fn test_config_is_written_as_json() {
        let sources = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let layout = RunLayout::create(out.path(), date(), sources.path()).unwrap();

        let path = layout.save_config(&serde_json::json!({ "epochs": 2 })).unwrap();
        let back: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back["epochs"], 2);
    }
}
