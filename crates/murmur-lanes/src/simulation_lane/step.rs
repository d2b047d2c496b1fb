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

//! The per-tick step pipeline.
//!
//! One tick walks `Idle -> StagingIn -> (Dispatching -> StagingOut) x 5 ->
//! Integrating -> StagingOut -> Committed -> Idle`. Everything up to the
//! final read-back works on scratch arrays owned by the pipeline; only the
//! commit touches [`SimulationState`], and it does so by swapping arrays.

use super::hunt;
use super::kernels::KernelRegistry;
use super::staging::StagingLayer;
use murmur_core::flocking::{PredatorParams, RuleKind, SINGLE_STEP};
use murmur_core::{Agent, ComputeError, Swarm, TickError, TickPhase, Vec2};

/// Where the pipeline is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Between ticks.
    Idle,
    /// Writing the current swarm and predators.
    StagingIn,
    /// Running a rule kernel.
    Dispatching {
        /// The rule being run.
        rule: RuleKind,
    },
    /// Reading a result back; `None` is the next swarm.
    StagingOut {
        /// The rule whose output is read.
        rule: Option<RuleKind>,
    },
    /// Running `single_step`.
    Integrating,
    /// The new state has been swapped in.
    Committed,
}

/// The committed simulation state between ticks.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    swarm: Swarm,
    predators: Vec<Agent>,
    rule_outputs: Vec<Vec<Vec2>>,
    ticks: u64,
}

impl SimulationState {
    /// The state before the first tick. Rule outputs start zeroed.
    pub fn new(swarm: Swarm, predators: Vec<Agent>) -> Self {
        let rule_outputs = RuleKind::ALL
            .iter()
            .map(|_| vec![Vec2::ZERO; swarm.len()])
            .collect();
        Self {
            swarm,
            predators,
            rule_outputs,
            ticks: 0,
        }
    }

    /// The current swarm.
    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    /// The current predators.
    pub fn predators(&self) -> &[Agent] {
        &self.predators
    }

    /// Output of `rule` in the last committed tick.
    pub fn rule_output(&self, rule: RuleKind) -> &[Vec2] {
        &self.rule_outputs[rule.index()]
    }

    /// Number of committed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn at(phase: TickPhase) -> impl FnOnce(ComputeError) -> (TickPhase, ComputeError) {
    move |err| (phase, err)
}

/// Drives one device through the tick sequence.
///
/// Fields are declared in reverse creation order: the staging buffers are
/// released before the kernels that were bound to them.
#[derive(Debug)]
pub struct StepPipeline {
    staging: StagingLayer,
    kernels: KernelRegistry,
    predator: PredatorParams,
    state: PipelineState,
    next_swarm: Swarm,
    rule_outputs: Vec<Vec<Vec2>>,
}

impl StepPipeline {
    /// Binds every kernel's static arguments against `staging`.
    ///
    /// `kernels` must hold the five rules and `single_step`.
    pub fn new(
        kernels: KernelRegistry,
        staging: StagingLayer,
        predator: PredatorParams,
    ) -> Result<Self, ComputeError> {
        for rule in RuleKind::ALL {
            kernels.bind_static_args(rule.entry_point(), &staging.rule_args(rule))?;
        }
        kernels.bind_static_args(SINGLE_STEP, &staging.single_step_args())?;

        let n = staging.swarm_size() as usize;
        log::debug!("Step pipeline ready for {n} members");
        Ok(Self {
            next_swarm: Swarm::zeroed(n),
            rule_outputs: RuleKind::ALL.iter().map(|_| vec![Vec2::ZERO; n]).collect(),
            staging,
            kernels,
            predator,
            state: PipelineState::Idle,
        })
    }

    /// Where the pipeline currently is. Always `Idle` between calls.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// The buffers the pipeline stages through.
    pub fn staging(&self) -> &StagingLayer {
        &self.staging
    }

    /// The kernels the pipeline dispatches.
    pub fn kernels(&self) -> &KernelRegistry {
        &self.kernels
    }

    fn enter(&mut self, next: PipelineState) {
        log::trace!("StepPipeline: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Runs one tick against `state`.
    ///
    /// On success the new swarm and rule outputs are swapped in and the
    /// predators chase the committed swarm. On failure `state` is left
    /// exactly as it was and the pipeline is back to `Idle`.
    pub fn run_tick(&mut self, state: &mut SimulationState) -> Result<(), TickError> {
        let tick = state.ticks;
        if let Err((phase, reason)) = self.stage_and_dispatch(state) {
            log::warn!("Tick {tick} aborted while {phase}: {reason}");
            self.enter(PipelineState::Idle);
            return Err(TickError {
                tick,
                phase,
                reason,
            });
        }

        self.enter(PipelineState::Committed);
        std::mem::swap(&mut state.swarm, &mut self.next_swarm);
        std::mem::swap(&mut state.rule_outputs, &mut self.rule_outputs);
        state.ticks += 1;
        hunt::pursue_all(&mut state.predators, &state.swarm, &self.predator);

        self.enter(PipelineState::Idle);
        Ok(())
    }

    fn stage_and_dispatch(
        &mut self,
        state: &SimulationState,
    ) -> Result<(), (TickPhase, ComputeError)> {
        let work_items = self.staging.swarm_size();

        // All five rules read this one upload; nothing writes it until the
        // next tick.
        self.enter(PipelineState::StagingIn);
        self.staging
            .swarm
            .write(state.swarm.as_slice())
            .map_err(at(TickPhase::StagingIn))?;
        self.staging
            .write_predators(&state.predators)
            .map_err(at(TickPhase::StagingIn))?;

        for rule in RuleKind::ALL {
            self.enter(PipelineState::Dispatching { rule });
            self.kernels
                .kernel(rule.entry_point())
                .and_then(|kernel| kernel.dispatch(work_items))
                .map_err(at(TickPhase::Dispatching { rule }))?;

            self.enter(PipelineState::StagingOut { rule: Some(rule) });
            self.staging
                .rule_output(rule)
                .read(&mut self.rule_outputs[rule.index()])
                .map_err(at(TickPhase::StagingOut { rule: Some(rule) }))?;
        }

        self.enter(PipelineState::Integrating);
        self.kernels
            .kernel(SINGLE_STEP)
            .and_then(|kernel| kernel.dispatch(work_items))
            .map_err(at(TickPhase::Integrating))?;

        self.enter(PipelineState::StagingOut { rule: None });
        self.staging
            .next_swarm
            .read(self.next_swarm.as_mut_slice())
            .map_err(at(TickPhase::StagingOut { rule: None }))
    }
}
