// ============================================================
// Layer 6 — Accelerator Discovery
// ============================================================
// Resolves the `--gpu` id to a Burn WGPU device.
//
// The id is an index into the list of hardware accelerators
// (discrete, integrated and virtual GPUs) reported by wgpu, in
// enumeration order. CPU adapters such as software rasterisers
// don't count: a machine that only has those has no accelerator.
//
// Burn addresses a GPU by its kind and its index among adapters of
// that kind, so the global index is translated accordingly.
// Burn's automatic graphics API is Metal on macOS and Vulkan
// elsewhere, and it only looks at adapters of that API. Listing
// the same single API keeps a GPU exposed through several APIs
// from being counted more than once.

use anyhow::{Context, Result};
use burn::backend::wgpu::WgpuDevice;
use wgpu::DeviceType;

use crate::domain::traits::AcceleratorProbe;

/// Probes the machine's GPUs through wgpu.
pub struct WgpuProbe;

impl AcceleratorProbe for WgpuProbe {
    type Device = WgpuDevice;

    fn select(&self, id: &str) -> Result<Option<WgpuDevice>> {
        let index: usize = id
            .trim()
            .parse()
            .with_context(|| format!("Invalid accelerator id '{id}', expected a number"))?;

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let kinds: Vec<DeviceType> = instance
            .enumerate_adapters(graphics_api())
            .iter()
            .map(|adapter| adapter.get_info().device_type)
            .filter(|kind| is_accelerator(*kind))
            .collect();
        tracing::debug!("Found {} accelerator adapter(s): {kinds:?}", kinds.len());

        Ok(pick_device(&kinds, index))
    }
}

/// The graphics API burn's WGPU backend runs on by default.
fn graphics_api() -> wgpu::Backends {
    if cfg!(target_os = "macos") {
        wgpu::Backends::METAL
    } else {
        wgpu::Backends::VULKAN
    }
}

fn is_accelerator(kind: DeviceType) -> bool {
    matches!(
        kind,
        DeviceType::DiscreteGpu | DeviceType::IntegratedGpu | DeviceType::VirtualGpu
    )
}

/// The `index`-th accelerator in `kinds`, as a Burn device.
fn pick_device(kinds: &[DeviceType], index: usize) -> Option<WgpuDevice> {
    let kind = *kinds.get(index)?;
    let nth = kinds[..index].iter().filter(|k| **k == kind).count();
    match kind {
        DeviceType::DiscreteGpu => Some(WgpuDevice::DiscreteGpu(nth)),
        DeviceType::IntegratedGpu => Some(WgpuDevice::IntegratedGpu(nth)),
        DeviceType::VirtualGpu => Some(WgpuDevice::VirtualGpu(nth)),
        DeviceType::Cpu | DeviceType::Other => None,
    }
}
