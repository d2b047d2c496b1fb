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

//! Traits implemented by concrete compute backends.

mod backend;
mod device;

pub use self::backend::ComputeBackend;
pub use self::device::{check_transfer_size, ComputeDevice};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::api::{
        ComputeDeviceType, DeviceDescriptor, DeviceSelection, PlatformDescriptor,
    };
    use crate::error::ComputeError;
    use std::sync::Arc;

    /// Enumerates a fixed topology; opening always fails so no device is needed.
    #[derive(Debug)]
    struct FixedTopology(Vec<usize>);

    impl ComputeBackend for FixedTopology {
        fn name(&self) -> &str {
            "fixed"
        }

        fn enumerate_platforms(&self) -> Vec<PlatformDescriptor> {
            (0..self.0.len())
                .map(|index| PlatformDescriptor {
                    index,
                    name: format!("platform {index}"),
                })
                .collect()
        }

        fn enumerate_devices(&self, platform: usize) -> Vec<DeviceDescriptor> {
            let count = self.0.get(platform).copied().unwrap_or(0);
            (0..count)
                .map(|index| DeviceDescriptor {
                    index,
                    name: format!("device {index}"),
                    platform: format!("platform {platform}"),
                    device_type: ComputeDeviceType::Cpu,
                })
                .collect()
        }

        fn open_device(
            &self,
            _platform: usize,
            device: usize,
        ) -> Result<Arc<dyn ComputeDevice>, ComputeError> {
            Err(ComputeError::DeviceUnavailable {
                device: format!("device {device}"),
                reason: "reached open_device".into(),
            })
        }
    }

    fn resolve(topology: Vec<usize>, platform: usize, device: usize) -> ComputeError {
        FixedTopology(topology)
            .resolve(DeviceSelection::new(platform, device))
            .unwrap_err()
    }

    #[test]
    fn empty_enumeration_is_fatal() {
        assert_eq!(resolve(vec![], 0, 0), ComputeError::NoPlatformsFound);
        assert!(matches!(
            resolve(vec![0], 0, 0),
            ComputeError::NoDevicesFound { .. }
        ));
    }

    #[test]
    fn out_of_range_never_reaches_the_device() {
        assert_eq!(
            resolve(vec![1], 1, 0),
            ComputeError::SelectionOutOfRange {
                what: "platform",
                index: 1,
                available: 1
            }
        );
        assert_eq!(
            resolve(vec![2], 0, 5),
            ComputeError::SelectionOutOfRange {
                what: "device",
                index: 5,
                available: 2
            }
        );
    }

    #[test]
    fn valid_selection_opens_the_device() {
        assert!(matches!(
            resolve(vec![1, 3], 1, 2),
            ComputeError::DeviceUnavailable { .. }
        ));
    }
}
