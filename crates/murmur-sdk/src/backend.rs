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

//! Construction of a compute backend from a configuration.

use murmur_core::compute::ComputeBackend;
use murmur_core::{BackendKind, SetupError, SimulationConfig};
use murmur_infra::{HostComputeBackend, HostKernelTable};
use std::fmt::Write;

/// The backend `config.backend` names.
///
/// The host backend runs the native flocking kernels with the configured
/// constants, so both backends evaluate the same rules.
pub fn backend_for(config: &SimulationConfig) -> Result<Box<dyn ComputeBackend>, SetupError> {
    match config.backend {
        BackendKind::Host => Ok(Box::new(HostComputeBackend::new(HostKernelTable::flocking(
            config.flocking,
            config.field,
        )))),
        #[cfg(feature = "wgpu")]
        BackendKind::Wgpu => Ok(Box::new(murmur_infra::WgpuComputeBackend::new())),
        #[cfg(not(feature = "wgpu"))]
        BackendKind::Wgpu => Err(SetupError::InvalidConfig(
            "this build does not include the wgpu backend".into(),
        )),
    }
}

/// A human-readable listing of every platform and device of `backend`,
/// with the indices a [`DeviceSelection`](murmur_core::compute::DeviceSelection) expects.
pub fn describe_devices(backend: &dyn ComputeBackend) -> String {
    let platforms = backend.enumerate_platforms();
    let mut out = String::new();
    if platforms.is_empty() {
        let _ = writeln!(out, "No {} platforms found", backend.name());
        return out;
    }
    for platform in platforms {
        let _ = writeln!(out, "Platform {}: {}", platform.index, platform.name);
        let devices = backend.enumerate_devices(platform.index);
        if devices.is_empty() {
            let _ = writeln!(out, "  (no compute-capable devices)");
        }
        for device in devices {
            let _ = writeln!(
                out,
                "  Device {}: {} ({})",
                device.index, device.name, device.device_type
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_infra::HostPlatform;

    #[test]
    fn host_config_builds_the_host_backend() {
        let config = SimulationConfig {
            backend: BackendKind::Host,
            ..SimulationConfig::default()
        };
        let backend = backend_for(&config).unwrap();
        assert_eq!(backend.name(), "host");
    }

    #[test]
    fn listing_shows_every_index() {
        let backend = HostComputeBackend::with_topology(
            HostKernelTable::new(),
            vec![
                HostPlatform::new("Alpha", &["A0", "A1"]),
                HostPlatform::new("Beta", &[]),
            ],
        );
        let listing = describe_devices(&backend);
        assert_eq!(
            listing,
            "Platform 0: Alpha\n  Device 0: A0 (CPU)\n  Device 1: A1 (CPU)\n\
             Platform 1: Beta\n  (no compute-capable devices)\n"
        );
    }
}
