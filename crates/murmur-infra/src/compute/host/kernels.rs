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

//! Native implementations of program entry points for the host device.
//!
//! The flocking kernels here follow the built-in WGSL program statement for
//! statement, including the order of floating-point accumulation, so the
//! host device can stand in for a GPU in tests.

use super::invocation::HostInvocation;
use murmur_core::compute::KernelSignature;
use murmur_core::flocking::{
    bindings, rule_signature, single_step_signature, FieldBounds, FlockingParams, RuleKind,
};
use murmur_core::{Agent, Vec2};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A native kernel body. It runs once per dispatch over all work items.
pub type NativeKernel = Arc<dyn Fn(&mut HostInvocation) -> Result<(), String> + Send + Sync>;

/// A native entry point and the signature it was written against.
#[derive(Clone)]
pub struct HostKernel {
    /// The argument slots the body expects.
    pub signature: KernelSignature,
    /// The body.
    pub run: NativeKernel,
}

/// Maps entry point names to native implementations.
#[derive(Clone, Default)]
pub struct HostKernelTable {
    entries: HashMap<String, HostKernel>,
}

impl fmt::Debug for HostKernelTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("HostKernelTable")
            .field("entry_points", &names)
            .finish()
    }
}

impl HostKernelTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The six flocking kernels evaluated with `params` inside `field`.
    pub fn flocking(params: FlockingParams, field: FieldBounds) -> Self {
        let mut table = Self::new();
        for rule in RuleKind::ALL {
            table.insert_native(rule_signature(rule), rule_kernel(rule, params, field));
        }
        table.insert_native(single_step_signature(), single_step_kernel(params));
        table
    }

    fn insert_native(&mut self, signature: KernelSignature, run: NativeKernel) {
        self.entries
            .insert(signature.entry_point.clone(), HostKernel { signature, run });
    }

    /// Registers (or replaces) the implementation of `signature.entry_point`.
    pub fn insert<F>(&mut self, signature: KernelSignature, run: F)
    where
        F: Fn(&mut HostInvocation) -> Result<(), String> + Send + Sync + 'static,
    {
        self.insert_native(signature, Arc::new(run));
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_kernel<F>(mut self, signature: KernelSignature, run: F) -> Self
    where
        F: Fn(&mut HostInvocation) -> Result<(), String> + Send + Sync + 'static,
    {
        self.insert(signature, run);
        self
    }

    /// Replaces a rule with one that writes `value` for every member.
    pub fn with_constant_rule(self, rule: RuleKind, value: Vec2) -> Self {
        self.with_kernel(rule_signature(rule), move |inv| {
            for_each_member(inv, rule.output_binding(), |_, _| value)
        })
    }

    /// Removes an entry point.
    pub fn without(mut self, entry_point: &str) -> Self {
        self.entries.remove(entry_point);
        self
    }

    /// The implementation of `entry_point`, if registered.
    pub fn get(&self, entry_point: &str) -> Option<&HostKernel> {
        self.entries.get(entry_point)
    }

    /// Returns `true` if `entry_point` has an implementation.
    pub fn contains(&self, entry_point: &str) -> bool {
        self.entries.contains_key(entry_point)
    }
}

/// Reads the swarm and truncates it to the bound agent count.
fn bound_swarm(inv: &HostInvocation) -> Result<Vec<Agent>, String> {
    let count = inv.uint(bindings::AGENT_COUNT)? as usize;
    let mut swarm = inv.read::<Agent>(bindings::SWARM)?;
    if count > swarm.len() {
        return Err(format!(
            "agent count {count} exceeds the swarm buffer of {} agents",
            swarm.len()
        ));
    }
    swarm.truncate(count);
    Ok(swarm)
}

/// Evaluates `f` for every active member and writes the results to `output`.
///
/// Invocations past the agent count do nothing, like the bounds check at the
/// top of every WGSL entry point.
fn for_each_member<F>(inv: &mut HostInvocation, output: u32, f: F) -> Result<(), String>
where
    F: Fn(usize, &[Agent]) -> Vec2,
{
    let swarm = bound_swarm(inv)?;
    let active = (inv.work_items() as usize).min(swarm.len());
    let mut out = inv.read::<Vec2>(output)?;
    if out.len() < active {
        return Err(format!(
            "output binding {output} holds {} elements, {active} needed",
            out.len()
        ));
    }
    for (i, slot) in out.iter_mut().enumerate().take(active) {
        *slot = f(i, &swarm);
    }
    inv.write(output, &out)
}

/// Offset from `swarm[i]` to the centre of mass of the others, divided down.
pub fn cohesion(i: usize, swarm: &[Agent], params: &FlockingParams) -> Vec2 {
    let n = swarm.len();
    if n <= 1 {
        return Vec2::ZERO;
    }
    let mut center = Vec2::ZERO;
    for (j, other) in swarm.iter().enumerate() {
        if j != i {
            center += other.position;
        }
    }
    center = center / (n - 1) as f32;
    (center - swarm[i].position) / params.cohesion_divisor
}

/// Repulsion from members strictly closer than the separation radius.
pub fn separation(i: usize, swarm: &[Agent], params: &FlockingParams) -> Vec2 {
    let own = swarm[i].position;
    let mut c = Vec2::ZERO;
    for (j, other) in swarm.iter().enumerate() {
        if j != i {
            let d = other.position - own;
            if d.length() < params.separation_radius {
                c -= d;
            }
        }
    }
    c
}

/// Offset from `swarm[i]`'s velocity to the others' mean velocity, divided down.
pub fn velocity_matching(i: usize, swarm: &[Agent], params: &FlockingParams) -> Vec2 {
    let n = swarm.len();
    if n <= 1 {
        return Vec2::ZERO;
    }
    let mut mean = Vec2::ZERO;
    for (j, other) in swarm.iter().enumerate() {
        if j != i {
            mean += other.velocity;
        }
    }
    mean = mean / (n - 1) as f32;
    (mean - swarm[i].velocity) / params.alignment_divisor
}

/// Per-axis push back inside `[margin, extent - margin]`.
pub fn boundary_avoidance(position: Vec2, params: &FlockingParams, field: &FieldBounds) -> Vec2 {
    let axis = |p: f32, extent: f32| {
        if p < params.boundary_margin {
            params.boundary_push
        } else if p > extent - params.boundary_margin {
            -params.boundary_push
        } else {
            0.0
        }
    };
    Vec2::new(
        axis(position.x, field.width),
        axis(position.y, field.height),
    )
}

/// Flight from every predator strictly closer than the avoidance radius.
pub fn predator_avoidance(position: Vec2, predators: &[Agent], params: &FlockingParams) -> Vec2 {
    let mut c = Vec2::ZERO;
    for predator in predators {
        let d = position - predator.position;
        if d.length() < params.predator_avoid_radius {
            c += d * params.predator_avoid_gain;
        }
    }
    c
}

/// Integrates one member: sums the rule outputs, updates and limits the
/// velocity, then advances the position.
pub fn integrate(agent: Agent, rules: [Vec2; 5], params: &FlockingParams) -> Agent {
    let sum = rules[0] + rules[1] + rules[2] + rules[3] + rules[4];
    let velocity = params
        .speed_limit
        .apply(agent.velocity + sum * params.integration_scale);
    Agent::new(agent.position + velocity, velocity)
}

fn rule_kernel(rule: RuleKind, params: FlockingParams, field: FieldBounds) -> NativeKernel {
    let output = rule.output_binding();
    match rule {
        RuleKind::Cohesion => Arc::new(move |inv: &mut HostInvocation| {
            for_each_member(inv, output, |i, swarm| cohesion(i, swarm, &params))
        }),
        RuleKind::Separation => Arc::new(move |inv: &mut HostInvocation| {
            for_each_member(inv, output, |i, swarm| separation(i, swarm, &params))
        }),
        RuleKind::VelocityMatching => Arc::new(move |inv: &mut HostInvocation| {
            for_each_member(inv, output, |i, swarm| velocity_matching(i, swarm, &params))
        }),
        RuleKind::BoundaryAvoidance => Arc::new(move |inv: &mut HostInvocation| {
            for_each_member(inv, output, |i, swarm| {
                boundary_avoidance(swarm[i].position, &params, &field)
            })
        }),
        RuleKind::PredatorAvoidance => Arc::new(move |inv: &mut HostInvocation| {
            let count = inv.uint(bindings::PREDATOR_COUNT)? as usize;
            let predators = inv.read::<Agent>(bindings::PREDATORS)?;
            let live = predators.get(..count).ok_or_else(|| {
                format!(
                    "predator count {count} exceeds the predator buffer of {} agents",
                    predators.len()
                )
            })?;
            for_each_member(inv, output, |i, swarm| {
                predator_avoidance(swarm[i].position, live, &params)
            })
        }),
    }
}

fn single_step_kernel(params: FlockingParams) -> NativeKernel {
    Arc::new(move |inv: &mut HostInvocation| {
        let swarm = bound_swarm(inv)?;
        let outputs = RuleKind::ALL
            .iter()
            .map(|rule| inv.read::<Vec2>(rule.output_binding()))
            .collect::<Result<Vec<_>, _>>()?;
        let mut next = inv.read::<Agent>(bindings::NEXT_SWARM)?;
        let active = (inv.work_items() as usize)
            .min(swarm.len())
            .min(next.len());
        if outputs.iter().any(|o| o.len() < active) {
            return Err(format!("rule outputs hold fewer than {active} elements"));
        }
        for i in 0..active {
            let rules = [
                outputs[0][i],
                outputs[1][i],
                outputs[2][i],
                outputs[3][i],
                outputs[4][i],
            ];
            next[i] = integrate(swarm[i], rules, &params);
        }
        inv.write(bindings::NEXT_SWARM, &next)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn at(x: f32, y: f32) -> Agent {
        Agent::at_rest(Vec2::new(x, y))
    }

    #[test]
    fn cohesion_pulls_toward_the_others() {
        let params = FlockingParams::default();
        let swarm = [at(0.0, 0.0), at(10.0, 0.0), at(20.0, 0.0)];
        // Centre of the others is (15, 0), offset 15, divided by 100.
        assert_relative_eq!(cohesion(0, &swarm, &params).x, 0.15);
        assert_eq!(cohesion(0, &swarm[..1], &params), Vec2::ZERO);
    }

    #[test]
    fn separation_only_within_radius() {
        let params = FlockingParams::default();
        let swarm = [at(0.0, 0.0), at(3.0, 4.0), at(150.0, 0.0)];
        assert_eq!(separation(0, &swarm, &params), Vec2::new(-3.0, -4.0));
        assert_eq!(separation(2, &swarm, &params), Vec2::ZERO);
    }

    #[test]
    fn velocity_matching_is_zero_alone() {
        let params = FlockingParams::default();
        let swarm = [Agent::new(Vec2::ZERO, Vec2::new(1.0, 0.0))];
        assert_eq!(velocity_matching(0, &swarm, &params), Vec2::ZERO);

        let pair = [
            Agent::new(Vec2::ZERO, Vec2::ZERO),
            Agent::new(Vec2::ZERO, Vec2::new(8.0, 0.0)),
        ];
        assert_eq!(velocity_matching(0, &pair, &params), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn boundary_pushes_inward_on_each_axis() {
        let params = FlockingParams::default();
        let field = FieldBounds::default();
        assert_eq!(
            boundary_avoidance(Vec2::new(5.0, 590.0), &params, &field),
            Vec2::new(1.0, -1.0)
        );
        assert_eq!(
            boundary_avoidance(Vec2::new(300.0, 300.0), &params, &field),
            Vec2::ZERO
        );
    }

    #[test]
    fn predators_repel_within_radius() {
        let params = FlockingParams::default();
        let predators = [at(10.0, 0.0), at(500.0, 0.0)];
        let push = predator_avoidance(Vec2::ZERO, &predators, &params);
        assert_relative_eq!(push.x, -0.5);
        assert_eq!(push.y, 0.0);
    }

    #[test]
    fn integration_damps_fast_members() {
        let params = FlockingParams::default();
        let agent = Agent::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 0.0));
        let next = integrate(agent, [Vec2::ZERO; 5], &params);
        assert_relative_eq!(next.velocity.x, 2.0);
        assert_relative_eq!(next.position.x, 3.0);
    }

    #[test]
    fn flocking_table_covers_the_program() {
        let table = HostKernelTable::flocking(FlockingParams::default(), FieldBounds::default());
        for name in ["rule_1", "rule_2", "rule_3", "rule_4", "rule_5", "single_step"] {
            assert!(table.contains(name), "{name}");
        }
        assert!(!table.without("rule_4").contains("rule_4"));
    }

    #[test]
    fn flocking_entries_carry_their_contract_signatures() {
        let table = HostKernelTable::flocking(FlockingParams::default(), FieldBounds::default());
        for rule in RuleKind::ALL {
            let kernel = table.get(rule.entry_point()).unwrap();
            assert_eq!(kernel.signature, rule_signature(rule));
        }
        let step = table.get("single_step").unwrap();
        assert_eq!(step.signature, single_step_signature());

        // Replacing one entry keeps the others.
        let table = table.with_constant_rule(RuleKind::Cohesion, Vec2::X);
        assert_eq!(table.get("rule_2").unwrap().signature, rule_signature(RuleKind::Separation));
    }
}
