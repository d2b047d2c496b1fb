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

//! # Murmur Infra
//!
//! Concrete implementations of the compute contracts of `murmur-core`.
//!
//! - [`compute::wgpu`]: GPU execution of WGSL programs through `wgpu`.
//! - [`compute::host`]: a CPU reference device that runs native
//!   implementations of each entry point and supports fault injection.

pub mod compute;

pub use compute::host::{FaultInjector, HostComputeBackend, HostKernelTable, HostPlatform};
#[cfg(feature = "wgpu")]
pub use compute::wgpu::WgpuComputeBackend;
