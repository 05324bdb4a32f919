// ============================================================
// Layer 6 — Logging
// ============================================================
// Installs the global tracing subscriber for a run and renders
// training events as log lines.
//
// Two outputs receive the same lines:
//   console  → stdout, "MM/DD HH:MM:SS AM message"
//   log.txt  → "YYYY-MM-DD HH:MM:SS,mmm message", truncated at
//              start, so a same-day rerun replaces the old log
//
// Filtering follows RUST_LOG; without it the crate logs at info.
// Level and target are omitted so each line is just a timestamp
// and the message, which keeps log.txt easy to grep and diff.

use anyhow::{Context, Result};
use std::{
    fs::File,
    path::Path,
    sync::Mutex,
};
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::domain::{events::TrainingEvent, traits::EventSink};

const DEFAULT_DIRECTIVE: &str = "sci_train=info";
const CONSOLE_TIME_FORMAT: &str = "%m/%d %I:%M:%S %p";
const FILE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Install console + file logging. Can only succeed once per process.
pub fn init(log_file: &Path) -> Result<()> {
    let file = open_log_file(log_file)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let console = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(false)
        .with_timer(ChronoLocal::new(CONSOLE_TIME_FORMAT.to_string()));

    let file = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_level(false)
        .with_timer(ChronoLocal::new(FILE_TIME_FORMAT.to_string()));

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .context("Logging is already initialised")?;
    Ok(())
}

fn open_log_file(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Cannot open log file '{}'", path.display()))
}

// ─── TracingSink ──────────────────────────────────────────────────────────────
/// Renders training events through `tracing`.
pub struct TracingSink;

/// How a given event is logged.
#[derive(Debug, PartialEq)]
enum LogLine {
    Error(String),
    Info(String),
    Warn(String),
    Debug(String),
}

fn render(event: &TrainingEvent) -> LogLine {
    match event {
        TrainingEvent::NoAccelerator => LogLine::Error("no gpu device available".to_string()),
        TrainingEvent::DeviceSelected { device } => LogLine::Info(format!("gpu device = {device}")),
        TrainingEvent::ConfigResolved { summary } => LogLine::Info(format!("args = {summary}")),
        TrainingEvent::AcceleratorFlagIgnored => LogLine::Warn(
            "WARNING: It looks like you have a GPU device, but aren't using it. \
             Training runs on the GPU regardless."
                .to_string(),
        ),
        TrainingEvent::ModelReady { params_millions } => {
            LogLine::Info(format!("model size = {params_millions:.6}"))
        }
        TrainingEvent::BatchCompleted { epoch, batch, loss } => {
            LogLine::Info(format!("train-epoch {epoch:03} {batch:03} {loss:.6}"))
        }
        TrainingEvent::EpochCompleted { epoch, mean_loss, .. } => {
            LogLine::Info(format!("train-epoch {epoch:03} {mean_loss:.6}"))
        }
        TrainingEvent::CheckpointSaved { epoch, path } => {
            LogLine::Debug(format!("epoch {epoch:03} checkpoint saved to {}", path.display()))
        }
        TrainingEvent::SamplingStarted { epoch, last_loss } => {
            LogLine::Info(format!("train {epoch:03} {last_loss:.6}"))
        }
        TrainingEvent::PreviewSaved { epoch, path } => {
            LogLine::Debug(format!("epoch {epoch:03} preview saved to {}", path.display()))
        }
    }
}

impl EventSink for TracingSink {
    fn record(&self, event: &TrainingEvent) -> Result<()> {
        match render(event) {
            LogLine::Error(msg) => tracing::error!("{msg}"),
            LogLine::Info(msg) => tracing::info!("{msg}"),
            LogLine::Warn(msg) => tracing::warn!("{msg}"),
            LogLine::Debug(msg) => tracing::debug!("{msg}"),
        }
        Ok(())
    }
}
