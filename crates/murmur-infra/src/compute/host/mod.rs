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

//! The host reference backend.
//!
//! Programs are still WGSL text: building one scans it for `@compute` entry
//! points and binds each to a native Rust body from a [`HostKernelTable`].
//! Everything else (handles, argument validation, size checks, blocking
//! transfers) behaves like a real device, which lets the whole simulation
//! pipeline run and be tested without a GPU.

mod backend;
mod device;
mod faults;
mod invocation;
pub mod kernels;

pub use self::backend::{HostComputeBackend, HostPlatform};
pub use self::device::{HostComputeDevice, HostResourceCounts};
pub use self::faults::{FaultInjector, FaultPoint};
pub use self::invocation::HostInvocation;
pub use self::kernels::{HostKernel, HostKernelTable, NativeKernel};
