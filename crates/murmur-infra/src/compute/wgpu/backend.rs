// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compute platform and device discovery through WGPU.
//!
//! Each WGPU backend API (Vulkan, Metal, DX12, GL, WebGPU) that exposes at
//! least one adapter becomes a platform, probed in a fixed order so that
//! indices are stable between runs on the same machine. Only adapters that
//! can run compute shaders are listed as devices.

use super::context::WgpuComputeContext;
use super::conversions::{backend_name, from_wgpu_device_type, PROBED_BACKENDS};
use super::device::WgpuComputeDevice;
use murmur_core::compute::{ComputeBackend, ComputeDevice, DeviceDescriptor, PlatformDescriptor};
use murmur_core::ComputeError;
use std::sync::Arc;

#[derive(Debug)]
struct WgpuPlatform {
    backend: wgpu::Backend,
    adapters: Vec<wgpu::Adapter>,
}

/// WGPU implementation of [`ComputeBackend`].
#[derive(Debug)]
pub struct WgpuComputeBackend {
    #[allow(dead_code)]
    instance: wgpu::Instance,
    platforms: Vec<WgpuPlatform>,
}

impl WgpuComputeBackend {
    /// Creates an instance and enumerates every compute-capable adapter.
    pub fn new() -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let mut platforms = Vec::new();

        for backend in PROBED_BACKENDS {
            let adapters = instance.enumerate_adapters(wgpu::Backends::from(backend));
            if adapters.is_empty() {
                continue;
            }
            let adapters: Vec<wgpu::Adapter> = adapters
                .into_iter()
                .filter(|adapter| {
                    let capable = adapter
                        .get_downlevel_capabilities()
                        .flags
                        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS);
                    if !capable {
                        log::info!(
                            "Skipping adapter \"{}\" on {}: no compute shader support",
                            adapter.get_info().name,
                            backend_name(backend)
                        );
                    }
                    capable
                })
                .collect();
            log::debug!(
                "{} platform exposes {} compute-capable adapter(s)",
                backend_name(backend),
                adapters.len()
            );
            platforms.push(WgpuPlatform { backend, adapters });
        }

        Self {
            instance,
            platforms,
        }
    }
}

impl Default for WgpuComputeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ComputeBackend for WgpuComputeBackend {
    fn name(&self) -> &str {
        "wgpu"
    }

    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
        self.platforms
            .iter()
            .enumerate()
            .map(|(index, p)| PlatformDescriptor {
                index,
                name: backend_name(p.backend).to_owned(),
            })
            .collect()
    }

    fn enumerate_devices(&self, platform: usize) -> Vec<DeviceDescriptor> {
        let Some(p) = self.platforms.get(platform) else {
            return Vec::new();
        };
        p.adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| {
                let info = adapter.get_info();
                DeviceDescriptor {
                    index,
                    name: info.name,
                    platform: backend_name(p.backend).to_owned(),
                    device_type: from_wgpu_device_type(info.device_type),
                }
            })
            .collect()
    }

    fn open_device(
        &self,
        platform: usize,
        device: usize,
    ) -> Result<Arc<dyn ComputeDevice>, ComputeError> {
        let adapter = self
            .platforms
            .get(platform)
            .and_then(|p| p.adapters.get(device))
            .ok_or_else(|| ComputeError::DeviceUnavailable {
                device: format!("{platform}:{device}"),
                reason: "no such device".into(),
            })?;
        let descriptor = self
            .enumerate_devices(platform)
            .into_iter()
            .nth(device)
            .ok_or_else(|| ComputeError::DeviceUnavailable {
                device: format!("{platform}:{device}"),
                reason: "no such device".into(),
            })?;

        let context = WgpuComputeContext::new(adapter.clone())?;
        Ok(Arc::new(WgpuComputeDevice::new(descriptor, context)))
    }
}
