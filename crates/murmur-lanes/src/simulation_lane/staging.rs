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

//! Device buffers mirroring the host-side simulation arrays.

use bytemuck::Pod;
use murmur_core::compute::{
    BufferAccess, BufferDescriptor, BufferId, BufferLayout, ComputeDevice, KernelArg, Scoped,
    ScopedStack,
};
use murmur_core::flocking::RuleKind;
use murmur_core::{Agent, ComputeError, Vec2};
use std::marker::PhantomData;
use std::sync::Arc;

/// A device buffer holding exactly `len` records of `T`.
///
/// Sized once at allocation. Transfers block until they complete and reject
/// host arrays of any other length.
#[derive(Debug)]
pub struct StagedBuffer<T: Pod> {
    handle: Scoped<BufferId>,
    label: String,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Pod> StagedBuffer<T> {
    /// Allocates a buffer of `len` records on `device`.
    pub fn allocate(
        device: &Arc<dyn ComputeDevice>,
        label: &str,
        len: usize,
        access: BufferAccess,
    ) -> Result<Self, ComputeError> {
        let id = device.create_buffer(&BufferDescriptor {
            label: label.into(),
            layout: BufferLayout::of::<T>(len),
            access,
        })?;
        Ok(Self {
            handle: Scoped::new(Arc::clone(device), id),
            label: label.to_owned(),
            len,
            _marker: PhantomData,
        })
    }

    /// The device-side handle.
    pub fn id(&self) -> BufferId {
        self.handle.id()
    }

    /// This buffer as a kernel argument.
    pub fn arg(&self) -> KernelArg {
        KernelArg::Buffer(self.id())
    }

    /// The buffer label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always `false`: empty buffers cannot be allocated.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copies `host` to the device.
    pub fn write(&self, host: &[T]) -> Result<(), ComputeError> {
        self.handle
            .device()
            .write_buffer(self.id(), bytemuck::cast_slice(host))
    }

    /// Copies the device contents into `host`.
    pub fn read(&self, host: &mut [T]) -> Result<(), ComputeError> {
        self.handle
            .device()
            .read_buffer(self.id(), bytemuck::cast_slice_mut(host))
    }
}

/// Every buffer the step pipeline uses.
///
/// Field order is the reverse of allocation order, and the rule outputs sit
/// on a [`ScopedStack`], so teardown releases the newest buffer first.
#[derive(Debug)]
pub struct StagingLayer {
    /// Next swarm, written by `single_step`.
    pub next_swarm: StagedBuffer<Agent>,
    /// One output per rule, in [`RuleKind::ALL`] order.
    pub rule_outputs: ScopedStack<StagedBuffer<Vec2>>,
    /// Predators, read by rule 5. Holds a single placeholder when there are none.
    pub predators: StagedBuffer<Agent>,
    /// Current swarm, read by every kernel.
    pub swarm: StagedBuffer<Agent>,
    swarm_size: u32,
    predator_count: u32,
}

impl StagingLayer {
    /// Allocates the buffers for `swarm_size` members and `predator_count` predators.
    ///
    /// # Arguments
    ///
    /// * `device` - The device every buffer is created on.
    /// * `swarm_size` - Records in the swarm, next swarm and rule output buffers.
    /// * `predator_count` - Live predators; the predator buffer holds at least one record.
    ///
    /// # Returns
    ///
    /// The layer, or the first allocation error. Buffers allocated before
    /// the failure are released newest first.
    pub fn allocate(
        device: &Arc<dyn ComputeDevice>,
        swarm_size: u32,
        predator_count: u32,
    ) -> Result<Self, ComputeError> {
        let n = swarm_size as usize;
        let swarm = StagedBuffer::allocate(device, "swarm", n, BufferAccess::ReadOnly)?;
        let predators = StagedBuffer::allocate(
            device,
            "predators",
            (predator_count as usize).max(1),
            BufferAccess::ReadOnly,
        )?;
        let mut rule_outputs = ScopedStack::with_capacity(RuleKind::ALL.len());
        for rule in RuleKind::ALL {
            rule_outputs.push(StagedBuffer::allocate(
                device,
                rule.output_label(),
                n,
                BufferAccess::ReadWrite,
            )?);
        }
        let next_swarm =
            StagedBuffer::allocate(device, "next_swarm", n, BufferAccess::ReadWrite)?;

        log::debug!(
            "Allocated staging buffers for {swarm_size} members and {predator_count} predators"
        );
        Ok(Self {
            next_swarm,
            rule_outputs,
            predators,
            swarm,
            swarm_size,
            predator_count,
        })
    }

    /// Number of swarm members every buffer is sized for.
    pub fn swarm_size(&self) -> u32 {
        self.swarm_size
    }

    /// Number of live predators.
    pub fn predator_count(&self) -> u32 {
        self.predator_count
    }

    /// The output buffer of `rule`.
    pub fn rule_output(&self, rule: RuleKind) -> &StagedBuffer<Vec2> {
        &self.rule_outputs[rule.index()]
    }

    /// Static arguments of a rule kernel, in signature order.
    pub fn rule_args(&self, rule: RuleKind) -> Vec<KernelArg> {
        let mut args = vec![
            self.swarm.arg(),
            KernelArg::Uint(self.swarm_size),
            self.rule_output(rule).arg(),
        ];
        if rule.reads_predators() {
            args.push(self.predators.arg());
            args.push(KernelArg::Uint(self.predator_count));
        }
        args
    }

    /// Static arguments of `single_step`, in signature order.
    pub fn single_step_args(&self) -> Vec<KernelArg> {
        let mut args = vec![self.swarm.arg(), KernelArg::Uint(self.swarm_size)];
        args.extend(self.rule_outputs.iter().map(StagedBuffer::arg));
        args.push(self.next_swarm.arg());
        args
    }

    /// Writes the predators, or the inert placeholder when there are none.
    pub fn write_predators(&self, predators: &[Agent]) -> Result<(), ComputeError> {
        if predators.is_empty() {
            self.predators.write(&[Agent::default()])
        } else {
            self.predators.write(predators)
        }
    }
}
