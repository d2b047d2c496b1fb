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

//! # Murmur Core
//!
//! Foundational crate containing the swarm data model, the backend-agnostic
//! compute contracts, and the configuration types shared by every other
//! crate of the simulator.

#![warn(missing_docs)]

pub mod agent;
pub mod compute;
pub mod config;
pub mod error;
pub mod flocking;
pub mod math;
pub mod utils;

pub use agent::{Agent, Swarm};
pub use config::{BackendKind, SimulationConfig};
pub use error::{ComputeError, SetupError, TickError, TickPhase};
pub use flocking::RuleKind;
pub use math::{SpeedLimiter, Vec2};
pub use utils::timer::Stopwatch;
