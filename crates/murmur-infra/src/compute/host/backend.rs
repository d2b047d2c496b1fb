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

use super::device::{HostComputeDevice, HostDeviceLedger, HostResourceCounts};
use super::faults::FaultInjector;
use super::kernels::HostKernelTable;
use crate::compute::lock;
use murmur_core::compute::{
    ComputeBackend, ComputeDevice, ComputeDeviceType, DeviceDescriptor, PlatformDescriptor,
};
use murmur_core::ComputeError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One simulated platform of the host backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
    /// Platform name.
    pub name: String,
    /// Names of its devices, in enumeration order. May be empty.
    pub devices: Vec<String>,
}

impl HostPlatform {
    /// Creates a platform description.
    pub fn new(name: impl Into<String>, devices: &[&str]) -> Self {
        Self {
            name: name.into(),
            devices: devices.iter().map(|d| (*d).to_owned()).collect(),
        }
    }
}

impl Default for HostPlatform {
    fn default() -> Self {
        Self::new("Host Reference", &["Host CPU"])
    }
}

#[derive(Debug)]
struct HostDeviceSlot {
    claim: Arc<AtomicBool>,
    stats: Arc<Mutex<HostDeviceLedger>>,
}

/// A compute backend whose devices run native kernels on the host.
///
/// Each device can be claimed by one resolved context at a time; the claim is
/// held until the last reference to the device is dropped.
#[derive(Debug)]
pub struct HostComputeBackend {
    platforms: Vec<HostPlatform>,
    slots: Vec<Vec<HostDeviceSlot>>,
    table: Arc<HostKernelTable>,
    faults: Arc<FaultInjector>,
}

impl HostComputeBackend {
    /// A backend with the default single-platform, single-device topology.
    pub fn new(table: HostKernelTable) -> Self {
        Self::with_topology(table, vec![HostPlatform::default()])
    }

    /// A backend with an explicit platform and device topology.
    pub fn with_topology(table: HostKernelTable, platforms: Vec<HostPlatform>) -> Self {
        let slots = platforms
            .iter()
            .map(|p| {
                p.devices
                    .iter()
                    .map(|_| HostDeviceSlot {
                        claim: Arc::new(AtomicBool::new(false)),
                        stats: Arc::new(Mutex::new(HostDeviceLedger::default())),
                    })
                    .collect()
            })
            .collect();
        Self {
            platforms,
            slots,
            table: Arc::new(table),
            faults: Arc::new(FaultInjector::new()),
        }
    }

    /// The fault injector shared by every device of this backend.
    pub fn faults(&self) -> &Arc<FaultInjector> {
        &self.faults
    }

    /// Live resources of a device, as last published by it.
    pub fn resource_counts(&self, platform: usize, device: usize) -> Option<HostResourceCounts> {
        self.slots
            .get(platform)?
            .get(device)
            .map(|slot| lock(&slot.stats).counts)
    }

    /// Every resource released by the current (or last) context of a device,
    /// in release order, as `"<kind> <label>"`.
    pub fn release_log(&self, platform: usize, device: usize) -> Option<Vec<String>> {
        self.slots
            .get(platform)?
            .get(device)
            .map(|slot| lock(&slot.stats).releases.clone())
    }

    /// Returns `true` while a resolved context holds the device.
    pub fn is_claimed(&self, platform: usize, device: usize) -> bool {
        self.slots
            .get(platform)
            .and_then(|p| p.get(device))
            .is_some_and(|slot| slot.claim.load(Ordering::Acquire))
    }
}

impl ComputeBackend for HostComputeBackend {
    fn name(&self) -> &str {
        "host"
    }

    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
        self.platforms
            .iter()
            .enumerate()
            .map(|(index, p)| PlatformDescriptor {
                index,
                name: p.name.clone(),
            })
            .collect()
    }

    fn enumerate_devices(&self, platform: usize) -> Vec<DeviceDescriptor> {
        let Some(p) = self.platforms.get(platform) else {
            return Vec::new();
        };
        p.devices
            .iter()
            .enumerate()
            .map(|(index, name)| DeviceDescriptor {
                index,
                name: name.clone(),
                platform: p.name.clone(),
                device_type: ComputeDeviceType::Cpu,
            })
            .collect()
    }

    fn open_device(
        &self,
        platform: usize,
        device: usize,
    ) -> Result<Arc<dyn ComputeDevice>, ComputeError> {
        let descriptor = self
            .enumerate_devices(platform)
            .into_iter()
            .nth(device)
            .ok_or_else(|| ComputeError::DeviceUnavailable {
                device: format!("{platform}:{device}"),
                reason: "no such device".into(),
            })?;
        let slot = &self.slots[platform][device];

        if slot
            .claim
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ComputeError::DeviceUnavailable {
                device: descriptor.name,
                reason: "already claimed by another context".into(),
            });
        }
        *lock(&slot.stats) = HostDeviceLedger::default();

        log::info!(
            "HostComputeBackend: Claimed device '{}' on '{}'",
            descriptor.name,
            descriptor.platform
        );
        Ok(Arc::new(HostComputeDevice::new(
            descriptor,
            Arc::clone(&slot.claim),
            Arc::clone(&self.table),
            Arc::clone(&self.faults),
            Arc::clone(&slot.stats),
        )))
    }
}
