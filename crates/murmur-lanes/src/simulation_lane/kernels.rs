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

use super::program::Program;
use murmur_core::compute::{KernelArg, KernelId, KernelSignature, Scoped, ScopedStack};
use murmur_core::ComputeError;
use std::sync::Arc;

/// One entry point of a built program.
#[derive(Debug)]
pub struct Kernel {
    handle: Scoped<KernelId>,
    signature: KernelSignature,
}

impl Kernel {
    /// The device-side handle.
    pub fn id(&self) -> KernelId {
        self.handle.id()
    }

    /// The entry point name.
    pub fn name(&self) -> &str {
        &self.signature.entry_point
    }

    /// The argument slots the kernel expects.
    pub fn signature(&self) -> &KernelSignature {
        &self.signature
    }

    /// Runs the kernel over `work_items` items and waits for it.
    pub fn dispatch(&self, work_items: u32) -> Result<(), ComputeError> {
        self.handle.device().dispatch(self.id(), work_items)
    }
}

/// The kernels extracted from a program, keyed by entry point.
///
/// Kernels are released in reverse extraction order.
#[derive(Debug)]
pub struct KernelRegistry {
    kernels: ScopedStack<Kernel>,
}

impl KernelRegistry {
    /// Creates one kernel per signature, in order.
    ///
    /// Every requested entry point must be declared by `program`; the first
    /// missing one fails the whole extraction with
    /// [`ComputeError::EntryPointNotFound`] and releases the kernels already
    /// created.
    pub fn extract(program: &Program, signatures: &[KernelSignature]) -> Result<Self, ComputeError> {
        if let Some(missing) = signatures
            .iter()
            .find(|s| !program.has_entry_point(&s.entry_point))
        {
            log::error!(
                "Program '{}' does not declare entry point '{}'",
                program.label(),
                missing.entry_point
            );
            return Err(ComputeError::EntryPointNotFound(
                missing.entry_point.clone(),
            ));
        }

        let device = program.device();
        let mut kernels = ScopedStack::with_capacity(signatures.len());
        for signature in signatures {
            let id = device.create_kernel(program.id(), signature)?;
            kernels.push(Kernel {
                handle: Scoped::new(Arc::clone(device), id),
                signature: signature.clone(),
            });
        }
        log::debug!(
            "Extracted {} kernels from program '{}'",
            kernels.len(),
            program.label()
        );
        Ok(Self { kernels })
    }

    /// The kernel for `name`, if extracted.
    pub fn get(&self, name: &str) -> Option<&Kernel> {
        self.kernels.iter().find(|k| k.name() == name)
    }

    /// The kernel for `name`, or [`ComputeError::EntryPointNotFound`].
    pub fn kernel(&self, name: &str) -> Result<&Kernel, ComputeError> {
        self.get(name)
            .ok_or_else(|| ComputeError::EntryPointNotFound(name.to_owned()))
    }

    /// Attaches the arguments of `name` that stay fixed for the whole run.
    ///
    /// Arguments are validated against the kernel signature immediately.
    pub fn bind_static_args(&self, name: &str, args: &[KernelArg]) -> Result<(), ComputeError> {
        let kernel = self.kernel(name)?;
        kernel.handle.device().bind_kernel_args(kernel.id(), args)
    }

    /// Entry point names, in extraction order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.kernels.iter().map(Kernel::name)
    }

    /// Number of kernels.
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    /// Returns `true` if nothing was extracted.
    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }
}
