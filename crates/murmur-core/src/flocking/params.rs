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

//! Tunable constants of the flocking rules and the predator.

use crate::math::{SpeedLimiter, Vec2};
use serde::{Deserialize, Serialize};

/// The rectangular field the swarm lives in, from the origin to `(width, height)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBounds {
    /// Extent along x.
    pub width: f32,
    /// Extent along y.
    pub height: f32,
}

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 600.0,
        }
    }
}

impl FieldBounds {
    /// Returns `true` if `point` lies inside the field, borders included.
    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// Constants of the five rules and of the integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockingParams {
    /// Rule 1 divides the offset to the others' centre of mass by this.
    pub cohesion_divisor: f32,
    /// Rule 2 repels from neighbours strictly closer than this.
    pub separation_radius: f32,
    /// Rule 3 divides the offset to the others' mean velocity by this.
    pub alignment_divisor: f32,
    /// Rule 4 pushes back members closer than this to a border.
    pub boundary_margin: f32,
    /// Rule 4 push magnitude per axis.
    pub boundary_push: f32,
    /// Rule 5 reacts to predators strictly closer than this.
    pub predator_avoid_radius: f32,
    /// Rule 5 scales the offset away from each predator by this.
    pub predator_avoid_gain: f32,
    /// `single_step` scales the rule sum by this before adding it to the velocity.
    pub integration_scale: f32,
    /// Soft limiter applied to swarm velocities after integration.
    pub speed_limit: SpeedLimiter,
}

impl Default for FlockingParams {
    fn default() -> Self {
        Self {
            cohesion_divisor: 100.0,
            separation_radius: 100.0,
            alignment_divisor: 8.0,
            boundary_margin: 20.0,
            boundary_push: 1.0,
            predator_avoid_radius: 80.0,
            predator_avoid_gain: 0.05,
            integration_scale: 0.1,
            speed_limit: SpeedLimiter::new(2.0, 1.5),
        }
    }
}

/// Constants of the host-side predator hunt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredatorParams {
    /// The offset to the target is divided by this and added to the velocity.
    pub pursuit_divisor: f32,
    /// Soft limiter applied to predator velocities.
    pub speed_limit: SpeedLimiter,
}

impl Default for PredatorParams {
    fn default() -> Self {
        Self {
            pursuit_divisor: 35.0,
            speed_limit: SpeedLimiter::new(0.2, 10.0),
        }
    }
}
