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

use murmur_core::compute::{ComputeDevice, ProgramDescriptor, ProgramId, Scoped};
use murmur_core::ComputeError;
use std::sync::Arc;

/// A built program. Immutable for its whole lifetime.
#[derive(Debug)]
pub struct Program {
    handle: Scoped<ProgramId>,
    label: String,
    entry_points: Vec<String>,
}

impl Program {
    /// The device-side handle.
    pub fn id(&self) -> ProgramId {
        self.handle.id()
    }

    /// The device the program was built for.
    pub fn device(&self) -> &Arc<dyn ComputeDevice> {
        self.handle.device()
    }

    /// The label the program was built with.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Declared `@compute` entry points, in source order.
    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }

    /// Returns `true` if `name` is a declared entry point.
    pub fn has_entry_point(&self, name: &str) -> bool {
        self.entry_points.iter().any(|e| e == name)
    }
}

/// Compiles kernel source for one device.
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    label: String,
}

impl ProgramBuilder {
    /// A builder labelling its programs `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Builds `source` on `device`.
    ///
    /// # Arguments
    ///
    /// * `device` - The device to compile for. The program keeps a handle to it.
    /// * `source` - Complete WGSL text.
    ///
    /// A failed build is logged with the compiler's diagnostics verbatim and
    /// returned as [`ComputeError::BuildFailed`].
    pub fn build(
        &self,
        device: &Arc<dyn ComputeDevice>,
        source: &str,
    ) -> Result<Program, ComputeError> {
        let descriptor = ProgramDescriptor {
            label: self.label.as_str().into(),
            source: source.into(),
        };
        let id = match device.build_program(&descriptor) {
            Ok(id) => id,
            Err(err) => {
                if let ComputeError::BuildFailed { diagnostics, .. } = &err {
                    log::error!("Program '{}' failed to build:\n{diagnostics}", self.label);
                }
                return Err(err);
            }
        };
        let handle = Scoped::new(Arc::clone(device), id);
        let entry_points = device.program_entry_points(id)?;

        log::info!(
            "Built program '{}' on '{}' ({} entry points)",
            self.label,
            device.descriptor().name,
            entry_points.len()
        );
        Ok(Program {
            handle,
            label: self.label.clone(),
            entry_points,
        })
    }
}
