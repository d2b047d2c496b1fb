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

//! Built-in WGSL source of the flocking program.
//!
//! The embedded body declares the six entry points of the kernel contract
//! (`rule_1`..`rule_5` and `single_step`) and refers to its tunables by
//! name. [`flocking_program_source`] prepends a generated block of `const`
//! declarations so the device evaluates exactly the values the host uses.

use murmur_core::flocking::{FieldBounds, FlockingParams};
use std::fmt::Write;

/// The flocking kernels, without their constants.
pub const FLOCKING_WGSL: &str = include_str!("flocking.wgsl");

/// The `const` block the kernels expect, one declaration per line.
pub fn flocking_prelude(params: &FlockingParams, field: &FieldBounds) -> String {
    let constants = [
        ("COHESION_DIVISOR", params.cohesion_divisor),
        ("SEPARATION_RADIUS", params.separation_radius),
        ("ALIGNMENT_DIVISOR", params.alignment_divisor),
        ("BOUNDARY_MARGIN", params.boundary_margin),
        ("BOUNDARY_PUSH", params.boundary_push),
        ("PREDATOR_AVOID_RADIUS", params.predator_avoid_radius),
        ("PREDATOR_AVOID_GAIN", params.predator_avoid_gain),
        ("INTEGRATION_SCALE", params.integration_scale),
        ("SPEED_CEILING", params.speed_limit.ceiling),
        ("SPEED_DAMPING", params.speed_limit.damping),
        ("FIELD_WIDTH", field.width),
        ("FIELD_HEIGHT", field.height),
    ];
    let mut prelude = String::new();
    for (name, value) in constants {
        // `{:?}` always prints a decimal point or an exponent, so the
        // literal stays a float in WGSL.
        let _ = writeln!(prelude, "const {name}: f32 = {value:?};");
    }
    prelude
}

/// The complete flocking program for `params` inside `field`.
pub fn flocking_program_source(params: &FlockingParams, field: &FieldBounds) -> String {
    let mut source = flocking_prelude(params, field);
    source.push('\n');
    source.push_str(FLOCKING_WGSL);
    source
}
