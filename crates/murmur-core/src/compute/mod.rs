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

//! Backend-agnostic compute contracts.
//!
//! Concrete backends live in `murmur-infra`; the simulation lanes only ever
//! talk to the [`ComputeBackend`] and [`ComputeDevice`] traits defined here.

pub mod api;
pub mod guard;
pub mod signature;
pub mod source;
pub mod traits;

pub use self::api::*;
pub use self::guard::{DeviceResource, Scoped, ScopedStack};
pub use self::signature::{KernelParam, KernelSignature, ParamKind};
pub use self::traits::{check_transfer_size, ComputeBackend, ComputeDevice};
