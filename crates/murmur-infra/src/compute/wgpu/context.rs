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

use murmur_core::ComputeError;

/// Holds the core WGPU state objects required for compute work.
///
/// It is initialized with a pre-selected adapter, making it a passive component.
#[derive(Debug)]
pub struct WgpuComputeContext {
    #[allow(dead_code)]
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
    pub device_limits: wgpu::Limits,
}

impl WgpuComputeContext {
    /// Creates the logical device and queue of `adapter`, blocking until ready.
    pub fn new(adapter: wgpu::Adapter) -> Result<Self, ComputeError> {
        let info = adapter.get_info();
        log::info!(
            "Initializing WGPU compute context on \"{}\" (Backend: {:?})",
            info.name,
            info.backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Murmur Compute Device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: wgpu::Trace::default(),
        }))
        .map_err(|e| ComputeError::DeviceUnavailable {
            device: info.name.clone(),
            reason: e.to_string(),
        })?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("WGPU Uncaptured Error: {e:?}");
        }));

        let device_limits = device.limits();
        log::debug!("Device limits: {device_limits:?}");

        Ok(Self {
            adapter,
            device,
            queue,
            adapter_name: info.name,
            device_limits,
        })
    }

    /// Blocks until all submitted work has completed.
    pub fn wait_idle(&self) -> Result<(), String> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Runs `operation` inside a validation error scope and returns its
    /// value, or the validation message if WGPU rejected anything it did.
    pub fn validated<R>(&self, operation: impl FnOnce(&wgpu::Device) -> R) -> Result<R, String> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = operation(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(error.to_string()),
            None => Ok(value),
        }
    }
}
