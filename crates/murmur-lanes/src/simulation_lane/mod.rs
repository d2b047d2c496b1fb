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

//! Simulation Lane
//!
//! Builds the flocking program for a device, extracts and binds its kernels,
//! stages the simulation arrays, and runs the per-tick step.

pub mod hunt;
mod kernels;
mod program;
pub mod shaders;
mod staging;
mod step;

pub use kernels::{Kernel, KernelRegistry};
pub use program::{Program, ProgramBuilder};
pub use staging::{StagedBuffer, StagingLayer};
pub use step::{PipelineState, SimulationState, StepPipeline};
