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

//! The simulation engine: setup, the tick loop entry point, and teardown.

use crate::spawn;
use crate::stats::TickStats;
use murmur_core::compute::{ComputeBackend, ComputeDevice, DeviceDescriptor};
use murmur_core::flocking::flocking_signatures;
use murmur_core::{Agent, RuleKind, SetupError, SimulationConfig, Stopwatch, Swarm, TickError, Vec2};
use murmur_lanes::shaders::flocking_program_source;
use murmur_lanes::{KernelRegistry, Program, ProgramBuilder, SimulationState, StagingLayer, StepPipeline};
use std::sync::Arc;

/// Configures and builds a [`SimulationEngine`].
#[derive(Debug, Clone)]
pub struct EngineBuilder {
    config: SimulationConfig,
    source: Option<String>,
    initial: Option<(Swarm, Vec<Agent>)>,
}

impl EngineBuilder {
    /// Replaces the built-in flocking program with `source`.
    ///
    /// The text is handed to the device as is: no constant prelude is
    /// prepended, so it must declare everything it uses.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Starts from the given swarm and predators instead of spawning them.
    ///
    /// Their sizes must match `swarm_size` and `predator_count`.
    pub fn with_initial_state(mut self, swarm: Swarm, predators: Vec<Agent>) -> Self {
        self.initial = Some((swarm, predators));
        self
    }

    /// Resolves a device on `backend` and sets up the whole pipeline.
    ///
    /// Nothing is left allocated on failure: every resource created so far
    /// is released in reverse creation order as the partial setup unwinds.
    pub fn build(self, backend: &dyn ComputeBackend) -> Result<SimulationEngine, SetupError> {
        let config = self.config;
        config.validate()?;

        let (swarm, predators) = match self.initial {
            Some((swarm, predators)) => {
                if swarm.len() != config.swarm_size || predators.len() != config.predator_count {
                    return Err(SetupError::InvalidConfig(format!(
                        "initial state has {} members and {} predators, configured for {} and {}",
                        swarm.len(),
                        predators.len(),
                        config.swarm_size,
                        config.predator_count
                    )));
                }
                (swarm, predators)
            }
            None => spawn::initial_state(&config),
        };

        log::info!(
            "Setting up simulation of {} members and {} predators on backend '{}'",
            config.swarm_size,
            config.predator_count,
            backend.name()
        );
        let device = backend.resolve(config.device)?;
        let descriptor = device.descriptor();
        log::info!(
            "Using device '{}' ({}) on platform '{}'",
            descriptor.name,
            descriptor.device_type,
            descriptor.platform
        );

        let source = match self.source {
            Some(source) => source,
            None => flocking_program_source(&config.flocking, &config.field),
        };
        let program = ProgramBuilder::new("flocking").build(&device, &source)?;
        let kernels = KernelRegistry::extract(&program, &flocking_signatures())?;

        // Both fit in 32 bits, `validate` checked it.
        let staging = StagingLayer::allocate(
            &device,
            config.swarm_size as u32,
            config.predator_count as u32,
        )?;
        let pipeline = StepPipeline::new(kernels, staging, config.predator)?;

        log::info!("Simulation engine ready");
        Ok(SimulationEngine {
            pipeline,
            program,
            state: SimulationState::new(swarm, predators),
            stats: TickStats::default(),
            config,
            device,
        })
    }
}

/// A running simulation bound to one compute device.
///
/// Dropping the engine releases its device resources: the staging buffers
/// and kernels first, then the program, then the device claim.
#[derive(Debug)]
pub struct SimulationEngine {
    pipeline: StepPipeline,
    program: Program,
    state: SimulationState,
    stats: TickStats,
    config: SimulationConfig,
    device: Arc<dyn ComputeDevice>,
}

impl SimulationEngine {
    /// Starts configuring an engine for `config`.
    pub fn builder(config: SimulationConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            source: None,
            initial: None,
        }
    }

    /// Builds an engine with the built-in program and a spawned initial state.
    pub fn new(config: SimulationConfig, backend: &dyn ComputeBackend) -> Result<Self, SetupError> {
        Self::builder(config).build(backend)
    }

    /// Runs one tick.
    ///
    /// A failed tick leaves every view exactly as it was before the call, so
    /// the caller can retry it or stop.
    pub fn tick(&mut self) -> Result<(), TickError> {
        let stopwatch = Stopwatch::start();
        match self.pipeline.run_tick(&mut self.state) {
            Ok(()) => {
                self.stats.record_success(stopwatch.elapsed());
                Ok(())
            }
            Err(err) => {
                self.stats.record_failure();
                Err(err)
            }
        }
    }

    /// The committed swarm.
    pub fn current_swarm(&self) -> &Swarm {
        self.state.swarm()
    }

    /// The committed predators.
    pub fn current_predators(&self) -> &[Agent] {
        self.state.predators()
    }

    /// The first predator, if any.
    pub fn current_predator(&self) -> Option<&Agent> {
        self.state.predators().first()
    }

    /// Per-member output of `rule` in the last committed tick; zeroed before
    /// the first one.
    pub fn rule_output(&self, rule: RuleKind) -> &[Vec2] {
        self.state.rule_output(rule)
    }

    /// The whole committed state.
    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Number of committed ticks.
    pub fn ticks_completed(&self) -> u64 {
        self.state.ticks()
    }

    /// Timing statistics of the ticks run so far.
    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// The device the engine runs on.
    pub fn device(&self) -> &DeviceDescriptor {
        self.device.descriptor()
    }

    /// The program the kernels were extracted from.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// The configuration the engine was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Tears the engine down, returning its final state.
    pub fn shutdown(self) -> SimulationState {
        self.state.clone()
    }
}

impl Drop for SimulationEngine {
    fn drop(&mut self) {
        log::info!(
            "Shutting down simulation engine on '{}' after {}",
            self.device.descriptor().name,
            self.stats
        );
    }
}
