// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a training run in order:
//
//   Step 1: Create the run directory    (Layer 6 - infra)
//   Step 2: Find the accelerator        (Layer 6 - infra)
//   Step 3: Report device and config    (Layer 6 - infra)
//   Step 4: Save config                 (Layer 6 - infra)
//   Step 5: List training/test images   (Layer 4 - data)
//   Step 6: Run training loop           (Layer 5 - ml)
//
// Step 1 is split out as `prepare` because the CLI installs the
// logger in between: log.txt lives inside the run directory.
//
// Reference: Rust Book §10 (Generics and Traits)
//            Burn Book §5 (Training)

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{
    dataset::{DatasetTask, ImageDataset},
    loader::DirImageSource,
};
use crate::domain::{
    events::TrainingEvent,
    traits::{AcceleratorProbe, EventSink},
};
use crate::infra::{
    checkpoint::CheckpointManager,
    experiment::RunLayout,
    metrics::MetricsLogger,
    preview::PreviewWriter,
};
use crate::ml::trainer::{run_training, TrainingData, TrainingOutputs, TrainingSummary};

/// Directory of unpaired low-light training images
pub const TRAIN_DATA_DIR: &str = "./datatrain";

/// Directory of test images rendered after every epoch
pub const TEST_DATA_DIR: &str = "./data/difficult";

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything a run depends on. Serialisable so each run directory
// records the exact configuration it was produced with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub batch_size: usize,
    pub cuda:       bool,
    pub gpu:        String,
    pub seed:       u64,
    pub epochs:     usize,
    pub lr:         f64,
    pub stage:      usize,
    pub save:       String,
    pub train_dir:  String,
    pub test_dir:   String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            cuda:       true,
            gpu:        "0".to_string(),
            seed:       2,
            epochs:     1000,
            lr:         3e-4,
            stage:      3,
            save:       "Exp/".to_string(),
            train_dir:  TRAIN_DATA_DIR.to_string(),
            test_dir:   TEST_DATA_DIR.to_string(),
        }
    }
}

/// How a run ended.
#[derive(Debug, PartialEq)]
pub enum RunOutcome {
    Completed(TrainingSummary),
    /// No accelerator was found; nothing was trained
    NoDevice,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Step 1: create `<save>/Train-<YYYYMMDD>/` and snapshot the sources
    /// this binary was built from.
    pub fn prepare(&self) -> Result<RunLayout> {
        RunLayout::create(
            Path::new(&self.config.save),
            chrono::Local::now().date_naive(),
            Path::new(env!("CARGO_MANIFEST_DIR")),
        )
    }

    /// Steps 2–6 on backend `B`, with the device found by `probe`.
    /// Events go to `events`, and epoch metrics also to `metrics.csv`.
    pub fn execute<B, P, S>(&self, layout: &RunLayout, probe: &P, events: &S) -> Result<RunOutcome>
    where
        B: AutodiffBackend,
        P: AcceleratorProbe<Device = B::Device>,
        S: EventSink,
    {
        let cfg = &self.config;
        tracing::info!("train binary = {}", env!("CARGO_PKG_NAME"));

        // ── Step 2: Accelerator ───────────────────────────────────────────────
        let Some(device) = probe.select(&cfg.gpu)? else {
            events.record(&TrainingEvent::NoAccelerator)?;
            return Ok(RunOutcome::NoDevice);
        };

        // ── Step 3: Report setup ──────────────────────────────────────────────
        let metrics = MetricsLogger::new(&layout.root)?;
        let sinks: [&dyn EventSink; 2] = [events, &metrics];
        let sink = &sinks[..];

        if !cfg.cuda {
            sink.record(&TrainingEvent::AcceleratorFlagIgnored)?;
        }
        sink.record(&TrainingEvent::DeviceSelected { device: cfg.gpu.clone() })?;
        sink.record(&TrainingEvent::ConfigResolved { summary: format!("{cfg:?}") })?;

        // ── Step 4: Save config ───────────────────────────────────────────────
        layout.save_config(cfg)?;

        // ── Step 5: Images ────────────────────────────────────────────────────
        let data = TrainingData {
            train: ImageDataset::from_dir(&DirImageSource, Path::new(&cfg.train_dir), DatasetTask::Train)?,
            test:  ImageDataset::from_dir(&DirImageSource, Path::new(&cfg.test_dir), DatasetTask::Test)?,
        };

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        let checkpoints = CheckpointManager::new(&layout.model_dir)?;
        let previews = PreviewWriter::new(&layout.image_dir);
        let outputs = TrainingOutputs { checkpoints: &checkpoints, previews: &previews };
        let summary = run_training::<B, _>(cfg, &device, data, outputs, sink)?;

        Ok(RunOutcome::Completed(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{Network, NetworkConfig};
    use crate::test_support::{
        backend_rng_guard, write_ramp_png, CpuProbe, RecordingSink, TestAutodiffBackend,
        TestBackend,
    };
    use std::fs;

    struct Fixture {
        _tmp:   tempfile::TempDir,
        config: TrainConfig,
    }

    /// 4 training images (8x8) and 3 test images in a temp dir.
    fn fixture(epochs: usize) -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let train = tmp.path().join("datatrain");
        let test = tmp.path().join("data/difficult");
        fs::create_dir_all(&train).unwrap();
        fs::create_dir_all(&test).unwrap();
        for i in 0..4 {
            write_ramp_png(&train.join(format!("low{i}.png")), 8, 8, 8 * i as u8);
        }
        for name in ["a", "b", "c"] {
            write_ramp_png(&test.join(format!("{name}.png")), 8, 8, 30);
        }

        let config = TrainConfig {
            batch_size: 2,
            epochs,
            stage: 2,
            save: tmp.path().join("Exp").to_string_lossy().into_owned(),
            train_dir: train.to_string_lossy().into_owned(),
            test_dir: test.to_string_lossy().into_owned(),
            ..TrainConfig::default()
        };
        Fixture { _tmp: tmp, config }
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_full_run_writes_checkpoints_previews_and_metrics() {
        let _guard = backend_rng_guard(2);
        let fx = fixture(2);
        let use_case = TrainUseCase::new(fx.config.clone());
        let layout = use_case.prepare().unwrap();

        let outcome = use_case
            .execute::<TestAutodiffBackend, _, _>(&layout, &CpuProbe { available: true }, &RecordingSink::default())
            .unwrap();
        let RunOutcome::Completed(summary) = outcome else { panic!("expected a completed run") };
        assert_eq!(summary.total_steps, 4);

        assert_eq!(file_names(&layout.model_dir), vec!["weights_0.mpk", "weights_1.mpk"]);
        assert_eq!(
            file_names(&layout.image_dir),
            vec!["a_0.png", "a_1.png", "b_0.png", "b_1.png", "c_0.png", "c_1.png"]
        );

        let csv = fs::read_to_string(layout.root.join("metrics.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);

        let saved: TrainConfig =
            serde_json::from_str(&fs::read_to_string(layout.root.join("train_config.json")).unwrap())
                .unwrap();
        assert_eq!(saved.epochs, 2);
        assert!(layout.scripts_dir.join("src/main.rs").is_file());
    }

    #[test]
    fn test_missing_accelerator_stops_before_training() {
        let fx = fixture(2);
        let use_case = TrainUseCase::new(fx.config.clone());
        let layout = use_case.prepare().unwrap();

        let events = RecordingSink::default();
        let outcome = use_case
            .execute::<TestAutodiffBackend, _, _>(&layout, &CpuProbe { available: false }, &events)
            .unwrap();
        assert_eq!(outcome, RunOutcome::NoDevice);
        assert_eq!(events.events(), vec![TrainingEvent::NoAccelerator]);
        assert!(file_names(&layout.model_dir).is_empty());
        assert!(file_names(&layout.image_dir).is_empty());
        assert!(!layout.root.join("train_config.json").exists());
    }

    #[test]
    fn test_cpu_flag_only_warns() {
        let _guard = backend_rng_guard(2);
        let mut fx = fixture(1);
        fx.config.cuda = false;
        let use_case = TrainUseCase::new(fx.config.clone());
        let layout = use_case.prepare().unwrap();

        let events = RecordingSink::default();
        let outcome = use_case
            .execute::<TestAutodiffBackend, _, _>(&layout, &CpuProbe { available: true }, &events)
            .unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert_eq!(events.events()[0], TrainingEvent::AcceleratorFlagIgnored);
        assert!(layout.model_dir.join("weights_0.mpk").is_file());
    }

    #[test]
    fn test_missing_training_directory_is_an_error() {
        let mut fx = fixture(1);
        fx.config.train_dir = "/nonexistent/datatrain".to_string();
        let use_case = TrainUseCase::new(fx.config.clone());
        let layout = use_case.prepare().unwrap();

        let result = use_case.execute::<TestAutodiffBackend, _, _>(
            &layout,
            &CpuProbe { available: true },
            &RecordingSink::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_checkpoint_loads_into_same_architecture() {
        let _guard = backend_rng_guard(2);
        let fx = fixture(1);
        let use_case = TrainUseCase::new(fx.config.clone());
        let layout = use_case.prepare().unwrap();
        use_case
            .execute::<TestAutodiffBackend, _, _>(&layout, &CpuProbe { available: true }, &RecordingSink::default())
            .unwrap();

        let device = Default::default();
        let model: Network<TestBackend> = NetworkConfig::new().with_stage(2).init(&device);
        let restored = CheckpointManager::new(&layout.model_dir)
            .unwrap()
            .load_model(model, 0, &device)
            .unwrap();
        assert_eq!(restored.stage, 2);
    }
}
