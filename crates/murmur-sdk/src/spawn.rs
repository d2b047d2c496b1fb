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

//! Initial placement of the swarm and the predators.

use murmur_core::flocking::FieldBounds;
use murmur_core::{Agent, SimulationConfig, Swarm, Vec2};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Scatters `size` members over `field`.
///
/// Positions are whole-number coordinates inside the field; each velocity
/// component is drawn from `[-0.5, 0.5)` in steps of `0.001`.
pub fn spawn_swarm<R: Rng + ?Sized>(size: usize, field: &FieldBounds, rng: &mut R) -> Swarm {
    let width = (field.width as u32).max(1);
    let height = (field.height as u32).max(1);
    let agents = (0..size)
        .map(|_| {
            let position = Vec2::new(
                rng.gen_range(0..width) as f32,
                rng.gen_range(0..height) as f32,
            );
            let velocity = Vec2::new(
                rng.gen_range(-500..500) as f32 / 1000.0,
                rng.gen_range(-500..500) as f32 / 1000.0,
            );
            Agent::new(position, velocity)
        })
        .collect();
    Swarm::from_agents(agents)
}

/// `count` predators at the origin, at rest.
pub fn spawn_predators(count: usize) -> Vec<Agent> {
    vec![Agent::at_rest(Vec2::ZERO); count]
}

/// The starting swarm and predators for `config`.
///
/// Uses `config.seed` when set, so the same configuration always starts from
/// the same state.
pub fn initial_state(config: &SimulationConfig) -> (Swarm, Vec<Agent>) {
    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    (
        spawn_swarm(config.swarm_size, &config.field, &mut rng),
        spawn_predators(config.predator_count),
    )
}
