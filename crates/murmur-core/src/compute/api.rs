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

//! Backend-agnostic descriptors and opaque handles for compute resources.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Describes one compute platform (a driver stack or API family).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDescriptor {
    /// Position of the platform in the enumeration order.
    pub index: usize,
    /// Human-readable platform name (e.g., "Vulkan").
    pub name: String,
}

/// The physical type of a compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// Software execution on the host CPU.
    Cpu,
    /// An unknown or unsupported device type.
    #[default]
    Unknown,
}

impl fmt::Display for ComputeDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComputeDeviceType::IntegratedGpu => "integrated GPU",
            ComputeDeviceType::DiscreteGpu => "discrete GPU",
            ComputeDeviceType::VirtualGpu => "virtual GPU",
            ComputeDeviceType::Cpu => "CPU",
            ComputeDeviceType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Describes one compute-capable device of a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Position of the device within its platform's enumeration order.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Name of the owning platform.
    pub platform: String,
    /// Physical type of the device.
    pub device_type: ComputeDeviceType,
}

/// An ordered `(platform, device)` index pair chosen from the enumerated lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSelection {
    /// Index into [`ComputeBackend::enumerate_platforms`](super::ComputeBackend::enumerate_platforms).
    pub platform: usize,
    /// Index into [`ComputeBackend::enumerate_devices`](super::ComputeBackend::enumerate_devices).
    pub device: usize,
}

impl DeviceSelection {
    /// Creates a new selection.
    pub const fn new(platform: usize, device: usize) -> Self {
        Self { platform, device }
    }
}

/// An opaque handle to a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque handle to a built program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub usize);

/// An opaque handle to a kernel extracted from a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelId(pub usize);

/// The shape of a buffer mirroring a host array: `count` elements of
/// `element_size` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLayout {
    /// Size of one element in bytes.
    pub element_size: u64,
    /// Number of elements.
    pub count: u64,
}

impl BufferLayout {
    /// Layout of `count` elements of type `T`.
    pub fn of<T>(count: usize) -> Self {
        Self {
            element_size: std::mem::size_of::<T>() as u64,
            count: count as u64,
        }
    }

    /// Total size of the buffer in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> u64 {
        self.element_size * self.count
    }

    /// Returns `true` if the layout describes zero bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size_in_bytes() == 0
    }
}

/// How kernels may access a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferAccess {
    /// Kernels only read the buffer.
    ReadOnly,
    /// Kernels may write the buffer.
    ReadWrite,
}

impl fmt::Display for BufferAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferAccess::ReadOnly => f.write_str("read-only"),
            BufferAccess::ReadWrite => f.write_str("read-write"),
        }
    }
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// A debug label, also used to target buffers in diagnostics.
    pub label: Cow<'a, str>,
    /// The size and element shape of the buffer.
    pub layout: BufferLayout,
    /// Kernel access mode.
    pub access: BufferAccess,
}

/// A descriptor used to build a [`ProgramId`] from kernel source text.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// A debug label for the program.
    pub label: Cow<'a, str>,
    /// WGSL source text.
    pub source: Cow<'a, str>,
}

/// A value bound to one kernel argument slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelArg {
    /// A device buffer.
    Buffer(BufferId),
    /// A 32-bit unsigned scalar.
    Uint(u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::math::Vec2;

    #[test]
    fn layouts_follow_element_types() {
        let swarm = BufferLayout::of::<Agent>(10);
        assert_eq!(swarm.size_in_bytes(), 160);
        let output = BufferLayout::of::<Vec2>(10);
        assert_eq!(output.size_in_bytes(), 80);
        assert!(BufferLayout::of::<Agent>(0).is_empty());
    }
}
