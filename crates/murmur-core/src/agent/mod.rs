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

//! Agent records and the fixed-capacity swarm arena.

use crate::math::Vec2;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A simulated entity: a swarm member or a predator.
///
/// Laid out as two consecutive `vec2<f32>` so a slice of agents is a valid
/// `array<Agent>` storage buffer on the device (16 bytes per record).
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(C)]
pub struct Agent {
    /// Position in field coordinates.
    pub position: Vec2,
    /// Displacement applied to `position` every tick.
    pub velocity: Vec2,
}

impl Agent {
    /// Creates a new agent.
    pub const fn new(position: Vec2, velocity: Vec2) -> Self {
        Self { position, velocity }
    }

    /// An agent at `position` with zero velocity.
    pub const fn at_rest(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// An ordered, fixed-size sequence of agents.
///
/// The length is fixed at construction: an agent's index is its identity for
/// the whole run and no agent is ever inserted or removed. Element access is
/// bounds checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Swarm {
    agents: Box<[Agent]>,
}

impl Swarm {
    /// Creates a swarm from an owned list of agents.
    pub fn from_agents(agents: Vec<Agent>) -> Self {
        Self {
            agents: agents.into_boxed_slice(),
        }
    }

    /// Creates a swarm of `len` zeroed agents.
    pub fn zeroed(len: usize) -> Self {
        Self {
            agents: vec![Agent::default(); len].into_boxed_slice(),
        }
    }

    /// Number of agents.
    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns `true` if the swarm has no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Returns the agent at `index`, or `None` when out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    /// Read-only view of all agents.
    #[inline]
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    /// Mutable view of the agents. The length cannot change through it.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    /// Iterates over the agents in index order.
    pub fn iter(&self) -> std::slice::Iter<'_, Agent> {
        self.agents.iter()
    }

    /// Raw bytes of the agent array, ready to stage into a device buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.agents)
    }

    /// Mutable raw bytes of the agent array, the target of a device read-back.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        bytemuck::cast_slice_mut(&mut self.agents)
    }

    /// Index of the agent closest to `point` by Euclidean distance.
    ///
    /// Ties go to the lowest index: a candidate replaces the current best only
    /// when it is strictly closer. Returns `None` for an empty swarm.
    pub fn nearest_to(&self, point: Vec2) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (index, agent) in self.agents.iter().enumerate() {
            let distance = agent.position.distance(point);
            let closer = match best {
                Some((_, best_distance)) => distance < best_distance,
                None => true,
            };
            if closer {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}

impl Index<usize> for Swarm {
    type Output = Agent;

    fn index(&self, index: usize) -> &Self::Output {
        &self.agents[index]
    }
}

impl<'a> IntoIterator for &'a Swarm {
    type Item = &'a Agent;
    type IntoIter = std::slice::Iter<'a, Agent>;

    fn into_iter(self) -> Self::IntoIter {
        self.agents.iter()
    }
}

impl From<Vec<Agent>> for Swarm {
    fn from(agents: Vec<Agent>) -> Self {
        Self::from_agents(agents)
    }
}
