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

//! # Murmur SDK
//!
//! The public entry point of the simulator. A [`SimulationEngine`] is built
//! from a [`SimulationConfig`](murmur_core::SimulationConfig) against any
//! compute backend, then advanced one tick at a time:
//!
//! ```no_run
//! use murmur_sdk::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SimulationConfig::default();
//! let backend = backend_for(&config)?;
//! let mut engine = SimulationEngine::new(config, backend.as_ref())?;
//! for _ in 0..600 {
//!     engine.tick()?;
//! }
//! println!("{}", engine.stats());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod engine;
pub mod loader;
pub mod spawn;
pub mod stats;

pub use backend::{backend_for, describe_devices};
pub use engine::{EngineBuilder, SimulationEngine};
pub use loader::{load_config, load_kernel_source};
pub use stats::TickStats;

/// The types most programs driving a simulation need.
pub mod prelude {
    pub use crate::{
        backend_for, describe_devices, load_config, load_kernel_source, EngineBuilder,
        SimulationEngine, TickStats,
    };
    pub use murmur_core::compute::{ComputeBackend, DeviceSelection};
    pub use murmur_core::flocking::{FieldBounds, FlockingParams, PredatorParams};
    pub use murmur_core::{
        Agent, BackendKind, RuleKind, SetupError, SimulationConfig, Swarm, TickError, TickPhase,
        Vec2,
    };
}
