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

//! The soft velocity limiter shared by swarm integration and the predator lane.

use super::Vec2;
use serde::{Deserialize, Serialize};

/// A soft limiter on velocity magnitude.
///
/// Once a velocity's magnitude exceeds `ceiling`, the whole vector is divided
/// by `damping`. The result is *not* clamped to `ceiling`: a velocity of
/// magnitude `0.35` under a `0.2 / 10.0` limiter comes out at `0.035`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimiter {
    /// Magnitude above which damping kicks in (exclusive).
    pub ceiling: f32,
    /// Divisor applied to the whole vector once the ceiling is exceeded.
    pub damping: f32,
}

impl SpeedLimiter {
    /// Creates a limiter with the given ceiling and damping factor.
    pub const fn new(ceiling: f32, damping: f32) -> Self {
        Self { ceiling, damping }
    }

    /// Applies the limiter to `velocity`.
    ///
    /// # Returns
    ///
    /// `velocity / damping` when its length is above the ceiling, otherwise
    /// `velocity` unchanged. The result may still exceed the ceiling.
    #[inline]
    pub fn apply(&self, velocity: Vec2) -> Vec2 {
        if velocity.length() > self.ceiling {
            velocity / self.damping
        } else {
            velocity
        }
    }

    /// Returns `true` if both fields are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.ceiling.is_finite()
            && self.ceiling > 0.0
            && self.damping.is_finite()
            && self.damping > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn damps_instead_of_clamping() {
        let limiter = SpeedLimiter::new(0.2, 10.0);
        let limited = limiter.apply(Vec2::new(0.35, 0.0));
        assert_relative_eq!(limited.length(), 0.035, epsilon = 1e-7);
    }

    #[test]
    fn leaves_slow_velocities_alone() {
        let limiter = SpeedLimiter::new(2.0, 1.5);
        let v = Vec2::new(1.2, -1.6);
        // |v| == 2.0 exactly; the ceiling is exclusive.
        assert_eq!(limiter.apply(v), v);
        assert_eq!(limiter.apply(Vec2::ZERO), Vec2::ZERO);
    }

    #[test]
    fn validity() {
        assert!(SpeedLimiter::new(2.0, 1.5).is_valid());
        assert!(!SpeedLimiter::new(0.0, 1.5).is_valid());
        assert!(!SpeedLimiter::new(2.0, f32::NAN).is_valid());
    }
}
