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

//! Run configuration of a simulation.

use crate::compute::DeviceSelection;
use crate::error::SetupError;
use crate::flocking::{FieldBounds, FlockingParams, PredatorParams};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which compute backend drives the rule kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU execution through wgpu.
    #[default]
    Wgpu,
    /// The CPU reference device.
    Host,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Wgpu => f.write_str("wgpu"),
            BackendKind::Host => f.write_str("host"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgpu" | "gpu" => Ok(BackendKind::Wgpu),
            "host" | "cpu" => Ok(BackendKind::Host),
            other => Err(format!("unknown backend '{other}', expected 'wgpu' or 'host'")),
        }
    }
}

/// Everything a simulation run is set up from.
///
/// Every field has a default, so a JSON document only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of swarm members `N`, fixed for the run.
    pub swarm_size: usize,
    /// Number of predators.
    pub predator_count: usize,
    /// Seed of the initial-state generator. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Extent of the field.
    pub field: FieldBounds,
    /// Rule constants.
    pub flocking: FlockingParams,
    /// Predator constants.
    pub predator: PredatorParams,
    /// Platform and device indices.
    pub device: DeviceSelection,
    /// Compute backend.
    pub backend: BackendKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            swarm_size: 10,
            predator_count: 1,
            seed: None,
            field: FieldBounds::default(),
            flocking: FlockingParams::default(),
            predator: PredatorParams::default(),
            device: DeviceSelection::default(),
            backend: BackendKind::default(),
        }
    }
}

fn positive(name: &str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SetupError::InvalidConfig(format!(
            "{name} must be finite and positive, got {value}"
        )))
    }
}

fn finite(name: &str, value: f32) -> Result<(), SetupError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SetupError::InvalidConfig(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

impl SimulationConfig {
    /// Parses a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SetupError> {
        serde_json::from_str(text).map_err(|e| SetupError::InvalidConfig(e.to_string()))
    }

    /// Rejects configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.swarm_size == 0 {
            return Err(SetupError::InvalidConfig(
                "swarm_size must be at least 1".into(),
            ));
        }
        if u32::try_from(self.swarm_size).is_err() || u32::try_from(self.predator_count).is_err() {
            return Err(SetupError::InvalidConfig(
                "swarm_size and predator_count must fit in 32 bits".into(),
            ));
        }

        positive("field.width", self.field.width)?;
        positive("field.height", self.field.height)?;

        let f = &self.flocking;
        positive("flocking.cohesion_divisor", f.cohesion_divisor)?;
        positive("flocking.alignment_divisor", f.alignment_divisor)?;
        finite("flocking.separation_radius", f.separation_radius)?;
        finite("flocking.boundary_margin", f.boundary_margin)?;
        finite("flocking.boundary_push", f.boundary_push)?;
        finite("flocking.predator_avoid_radius", f.predator_avoid_radius)?;
        finite("flocking.predator_avoid_gain", f.predator_avoid_gain)?;
        finite("flocking.integration_scale", f.integration_scale)?;
        positive("flocking.speed_limit.ceiling", f.speed_limit.ceiling)?;
        positive("flocking.speed_limit.damping", f.speed_limit.damping)?;

        let p = &self.predator;
        positive("predator.pursuit_divisor", p.pursuit_divisor)?;
        positive("predator.speed_limit.ceiling", p.speed_limit.ceiling)?;
        positive("predator.speed_limit.damping", p.speed_limit.damping)?;
        Ok(())
    }
}
