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

//! The flocking kernel contract.
//!
//! A flocking program defines six `@compute` entry points: five rule kernels
//! (`rule_1`..`rule_5`), each writing one partial velocity per swarm member,
//! and the `single_step` integration kernel that folds them into the next
//! swarm state. This module pins down their names, binding slots and
//! tunable constants so that every backend agrees on them.

mod params;

pub use self::params::{FieldBounds, FlockingParams, PredatorParams};

use crate::agent::Agent;
use crate::compute::{BufferAccess, KernelParam, KernelSignature};
use crate::math::Vec2;
use std::fmt;

/// Number of invocations per workgroup declared by every flocking kernel.
pub const WORKGROUP_SIZE: u32 = 64;

/// Binding slots shared by all flocking kernels.
pub mod bindings {
    /// Current swarm, `array<Agent>`, read-only.
    pub const SWARM: u32 = 0;
    /// Number of swarm members, `u32`.
    pub const AGENT_COUNT: u32 = 1;
    /// First rule output slot; rule `k` (1-based) writes slot `RULE_OUTPUT_BASE + k - 1`.
    pub const RULE_OUTPUT_BASE: u32 = 2;
    /// Predators, `array<Agent>`, read-only.
    pub const PREDATORS: u32 = 7;
    /// Next swarm, `array<Agent>`, written by `single_step`.
    pub const NEXT_SWARM: u32 = 8;
    /// Number of live predators, `u32`.
    pub const PREDATOR_COUNT: u32 = 9;
}

/// Name of the integration entry point.
pub const SINGLE_STEP: &str = "single_step";

/// The five flocking rules, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// Steer toward the centre of mass of the others.
    Cohesion,
    /// Steer away from close neighbours.
    Separation,
    /// Match the average velocity of the others.
    VelocityMatching,
    /// Push back inside the field.
    BoundaryAvoidance,
    /// Flee nearby predators.
    PredatorAvoidance,
}

impl RuleKind {
    /// All rules in dispatch order.
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Cohesion,
        RuleKind::Separation,
        RuleKind::VelocityMatching,
        RuleKind::BoundaryAvoidance,
        RuleKind::PredatorAvoidance,
    ];

    /// Zero-based position of the rule in [`RuleKind::ALL`].
    pub const fn index(self) -> usize {
        match self {
            RuleKind::Cohesion => 0,
            RuleKind::Separation => 1,
            RuleKind::VelocityMatching => 2,
            RuleKind::BoundaryAvoidance => 3,
            RuleKind::PredatorAvoidance => 4,
        }
    }

    /// Name of the rule's entry point in the program.
    pub const fn entry_point(self) -> &'static str {
        match self {
            RuleKind::Cohesion => "rule_1",
            RuleKind::Separation => "rule_2",
            RuleKind::VelocityMatching => "rule_3",
            RuleKind::BoundaryAvoidance => "rule_4",
            RuleKind::PredatorAvoidance => "rule_5",
        }
    }

    /// Binding slot of the rule's output buffer.
    pub const fn output_binding(self) -> u32 {
        bindings::RULE_OUTPUT_BASE + self.index() as u32
    }

    /// Whether the rule reads the predator buffer.
    pub const fn reads_predators(self) -> bool {
        matches!(self, RuleKind::PredatorAvoidance)
    }

    /// Buffer label used for the rule's output buffer.
    pub const fn output_label(self) -> &'static str {
        match self {
            RuleKind::Cohesion => "rule_1_output",
            RuleKind::Separation => "rule_2_output",
            RuleKind::VelocityMatching => "rule_3_output",
            RuleKind::BoundaryAvoidance => "rule_4_output",
            RuleKind::PredatorAvoidance => "rule_5_output",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Cohesion => "cohesion",
            RuleKind::Separation => "separation",
            RuleKind::VelocityMatching => "velocity matching",
            RuleKind::BoundaryAvoidance => "boundary avoidance",
            RuleKind::PredatorAvoidance => "predator avoidance",
        };
        write!(f, "{} ({name})", self.entry_point())
    }
}

const AGENT_SIZE: u64 = std::mem::size_of::<Agent>() as u64;
const VEC2_SIZE: u64 = std::mem::size_of::<Vec2>() as u64;

fn swarm_params() -> [KernelParam; 2] {
    [
        KernelParam::buffer(bindings::SWARM, AGENT_SIZE, BufferAccess::ReadOnly),
        KernelParam::uint(bindings::AGENT_COUNT),
    ]
}

/// Signature of a rule kernel.
///
/// Every rule takes the current swarm and its size and writes one `Vec2` per
/// member. Predator avoidance also takes the predator buffer and count.
pub fn rule_signature(rule: RuleKind) -> KernelSignature {
    let mut params = swarm_params().to_vec();
    params.push(KernelParam::buffer(
        rule.output_binding(),
        VEC2_SIZE,
        BufferAccess::ReadWrite,
    ));
    if rule.reads_predators() {
        params.push(KernelParam::buffer(
            bindings::PREDATORS,
            AGENT_SIZE,
            BufferAccess::ReadOnly,
        ));
        params.push(KernelParam::uint(bindings::PREDATOR_COUNT));
    }
    KernelSignature::new(rule.entry_point(), params).with_workgroup_size(WORKGROUP_SIZE)
}

/// Signature of the `single_step` integration kernel.
///
/// The rule outputs are bound read-write because they share their binding
/// slots with the rule kernels that write them.
pub fn single_step_signature() -> KernelSignature {
    let mut params = swarm_params().to_vec();
    params.extend(RuleKind::ALL.iter().map(|rule| {
        KernelParam::buffer(rule.output_binding(), VEC2_SIZE, BufferAccess::ReadWrite)
    }));
    params.push(KernelParam::buffer(
        bindings::NEXT_SWARM,
        AGENT_SIZE,
        BufferAccess::ReadWrite,
    ));
    KernelSignature::new(SINGLE_STEP, params).with_workgroup_size(WORKGROUP_SIZE)
}

/// All six signatures, rules first in dispatch order, then `single_step`.
pub fn flocking_signatures() -> Vec<KernelSignature> {
    RuleKind::ALL
        .iter()
        .copied()
        .map(rule_signature)
        .chain(std::iter::once(single_step_signature()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn entry_points_in_dispatch_order() {
        let names: Vec<_> = flocking_signatures()
            .into_iter()
            .map(|s| s.entry_point)
            .collect();
        assert_eq!(
            names,
            ["rule_1", "rule_2", "rule_3", "rule_4", "rule_5", "single_step"]
        );
    }

    #[test]
    fn bindings_agree_across_kernels() {
        // Any slot used by several kernels must mean the same thing in each.
        let mut seen: HashMap<u32, KernelParam> = HashMap::new();
        for signature in flocking_signatures() {
            for param in signature.params {
                let previous = seen.entry(param.binding).or_insert(param);
                assert_eq!(*previous, param, "slot {} in {}", param.binding, signature.entry_point);
            }
        }
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn only_predator_avoidance_reads_predators() {
        for rule in RuleKind::ALL {
            let has = rule_signature(rule)
                .params
                .iter()
                .any(|p| p.binding == bindings::PREDATORS);
            assert_eq!(has, rule.reads_predators());
        }
    }
}
