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

//! Host-side predator motion.
//!
//! Runs after a tick has been committed, so predators always chase the swarm
//! as it is at the end of the current tick.

use murmur_core::flocking::PredatorParams;
use murmur_core::{Agent, Swarm};

/// Advances one predator toward the nearest swarm member.
///
/// The offset to the target is divided by the pursuit divisor and added to
/// the velocity, the soft limiter is applied, then the position advances.
/// With no target the predator keeps drifting under the same limiter.
pub fn pursue(predator: Agent, swarm: &Swarm, params: &PredatorParams) -> Agent {
    let mut velocity = predator.velocity;
    if let Some(target) = swarm.nearest_to(predator.position) {
        velocity += (swarm[target].position - predator.position) / params.pursuit_divisor;
    }
    let velocity = params.speed_limit.apply(velocity);
    Agent::new(predator.position + velocity, velocity)
}

/// Advances every predator against the same committed swarm.
pub fn pursue_all(predators: &mut [Agent], swarm: &Swarm, params: &PredatorParams) {
    for predator in predators.iter_mut() {
        *predator = pursue(*predator, swarm, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use murmur_core::Vec2;

    fn swarm(points: &[(f32, f32)]) -> Swarm {
        Swarm::from_agents(
            points
                .iter()
                .map(|&(x, y)| Agent::at_rest(Vec2::new(x, y)))
                .collect(),
        )
    }

    #[test]
    fn chases_the_nearest_member() {
        let swarm = swarm(&[(0.0, 0.0), (10.0, 0.0), (3.0, 0.0)]);
        let predator = Agent::at_rest(Vec2::new(5.0, 0.0));
        let moved = pursue(predator, &swarm, &PredatorParams::default());

        // Target (3, 0): offset -2 / 35 stays under the 0.2 ceiling.
        assert_relative_eq!(moved.velocity.x, -2.0 / 35.0);
        assert_relative_eq!(moved.velocity.y, 0.0);
        assert_relative_eq!(moved.position.x, 5.0 - 2.0 / 35.0);
    }

    #[test]
    fn fast_predators_are_damped_not_clamped() {
        let swarm = swarm(&[(100.0, 0.0)]);
        let predator = Agent::at_rest(Vec2::ZERO);
        let moved = pursue(predator, &swarm, &PredatorParams::default());

        let raw = 100.0 / 35.0;
        assert_relative_eq!(moved.velocity.x, raw / 10.0, epsilon = 1e-6);
        assert!(moved.velocity.length() > 0.2);
    }

    #[test]
    fn every_predator_sees_the_same_swarm() {
        let swarm = swarm(&[(0.0, 0.0), (50.0, 0.0)]);
        let mut predators = [
            Agent::at_rest(Vec2::new(1.0, 0.0)),
            Agent::at_rest(Vec2::new(49.0, 0.0)),
        ];
        pursue_all(&mut predators, &swarm, &PredatorParams::default());
        assert!(predators[0].velocity.x < 0.0);
        assert!(predators[1].velocity.x > 0.0);
    }
}
