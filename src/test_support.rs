//! Shared fixtures for unit tests.

use anyhow::Result;
use burn::backend::ndarray::NdArrayDevice;
use burn::tensor::backend::Backend;
use std::cell::RefCell;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{events::TrainingEvent, traits::{AcceleratorProbe, EventSink}};

pub type TestBackend = burn::backend::NdArray<f32>;
pub type TestAutodiffBackend = burn::backend::Autodiff<TestBackend>;

// The NdArray RNG is process-global; tests that draw from it run one at a time.
static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// Serialise access to the backend RNG and seed it.
pub fn backend_rng_guard(seed: u64) -> MutexGuard<'static, ()> {
    let guard = BACKEND_RNG.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    TestBackend::seed(seed);
    guard
}

/// Write a solid-colour PNG.
pub fn write_png(path: &Path, width: u32, height: u32, rgb: [u8; 3]) {
    image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
        .save(path)
        .unwrap();
}

/// Write a PNG with a horizontal ramp so the image has some structure.
pub fn write_ramp_png(path: &Path, width: u32, height: u32, level: u8) {
    let img = image::RgbImage::from_fn(width, height, |x, _| {
        let v = level.saturating_add((x * 8) as u8);
        image::Rgb([v, v / 2, v / 3])
    });
    img.save(path).unwrap();
}

/// Collects every event in memory.
#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<TrainingEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TrainingEvent> {
        self.events.borrow().clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &TrainingEvent) -> Result<()> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// Probe that hands out the CPU device, or reports no accelerator.
pub struct CpuProbe {
    pub available: bool,
}

impl AcceleratorProbe for CpuProbe {
    type Device = NdArrayDevice;

    fn select(&self, _id: &str) -> Result<Option<NdArrayDevice>> {
        Ok(self.available.then(NdArrayDevice::default))
    }
}
