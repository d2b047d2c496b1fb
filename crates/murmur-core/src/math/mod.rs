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

//! 2D math primitives used by the swarm model.
//!
//! The types here are plain values laid out to match their WGSL counterparts
//! (`vec2<f32>`), so host arrays can be handed to a compute device byte for
//! byte.

pub mod limiter;
pub mod vector;

pub use self::limiter::SpeedLimiter;
pub use self::vector::Vec2;
