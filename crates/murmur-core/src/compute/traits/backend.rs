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

use super::device::ComputeDevice;
use crate::compute::api::{DeviceDescriptor, DeviceSelection, PlatformDescriptor};
use crate::error::ComputeError;
use std::fmt::Debug;
use std::sync::Arc;

/// Discovers compute platforms and devices and binds a device for use.
///
/// This is the entry point of every concrete compute implementation. A
/// backend only enumerates: an empty platform or device list is reported as
/// an empty `Vec`, never as an error. Deciding that an empty list is fatal is
/// the job of [`resolve`](ComputeBackend::resolve).
pub trait ComputeBackend: Send + Sync + Debug {
    /// A short, human-readable name for the backend (e.g., "wgpu").
    fn name(&self) -> &str;

    /// Lists the available platforms in a stable order.
    fn enumerate_platforms(&self) -> Vec<PlatformDescriptor>;

    /// Lists the compute-capable devices of `platform`.
    ///
    /// Returns an empty list for an unknown platform index.
    fn enumerate_devices(&self, platform: usize) -> Vec<DeviceDescriptor>;

    /// Binds the device at `(platform, device)` and creates its in-order queue.
    ///
    /// Indices are assumed to have been validated against the enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`ComputeError::DeviceUnavailable`] when the device cannot be
    /// bound, for instance because it is already exclusively claimed.
    fn open_device(
        &self,
        platform: usize,
        device: usize,
    ) -> Result<Arc<dyn ComputeDevice>, ComputeError>;

    /// Validates `selection` against the enumeration and opens the device.
    ///
    /// Checks run in this order: no platforms, platform out of range, no
    /// devices on the platform, device out of range. Out-of-range indices
    /// never reach [`open_device`](ComputeBackend::open_device).
    fn resolve(&self, selection: DeviceSelection) -> Result<Arc<dyn ComputeDevice>, ComputeError> {
        let platforms = self.enumerate_platforms();
        if platforms.is_empty() {
            return Err(ComputeError::NoPlatformsFound);
        }
        let platform = platforms
            .get(selection.platform)
            .ok_or(ComputeError::SelectionOutOfRange {
                what: "platform",
                index: selection.platform,
                available: platforms.len(),
            })?;

        let devices = self.enumerate_devices(selection.platform);
        if devices.is_empty() {
            return Err(ComputeError::NoDevicesFound {
                platform: platform.name.clone(),
            });
        }
        let device = devices
            .get(selection.device)
            .ok_or(ComputeError::SelectionOutOfRange {
                what: "device",
                index: selection.device,
                available: devices.len(),
            })?;

        log::info!(
            "{}: Resolving device '{}' ({}) on platform '{}'",
            self.name(),
            device.name,
            device.device_type,
            platform.name
        );
        self.open_device(selection.platform, selection.device)
    }
}
