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

//! The host reference device.

use super::faults::{FaultInjector, FaultPoint};
use super::invocation::{HostInvocation, Slot};
use super::kernels::{HostKernelTable, NativeKernel};
use crate::compute::lock;
use murmur_core::compute::source::{check_brackets, compute_entry_points};
use murmur_core::compute::{
    check_transfer_size, BufferAccess, BufferDescriptor, BufferId, BufferLayout, ComputeDevice,
    DeviceDescriptor, KernelArg, KernelId, KernelSignature, ParamKind, ProgramDescriptor,
    ProgramId,
};
use murmur_core::ComputeError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct HostProgramEntry {
    label: String,
    entry_points: Vec<String>,
}

struct HostKernelEntry {
    signature: KernelSignature,
    run: NativeKernel,
    args: Option<Vec<KernelArg>>,
}

impl std::fmt::Debug for HostKernelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostKernelEntry")
            .field("entry_point", &self.signature.entry_point)
            .field("bound", &self.args.is_some())
            .finish()
    }
}

#[derive(Debug)]
struct HostBufferEntry {
    label: String,
    layout: BufferLayout,
    access: BufferAccess,
    data: Vec<u8>,
}

/// Live resource counts of a [`HostComputeDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HostResourceCounts {
    /// Live programs.
    pub programs: usize,
    /// Live kernels.
    pub kernels: usize,
    /// Live buffers.
    pub buffers: usize,
}

impl HostResourceCounts {
    /// Returns `true` once every resource has been released.
    pub fn is_empty(&self) -> bool {
        self.programs == 0 && self.kernels == 0 && self.buffers == 0
    }
}

/// What a device publishes to its backend slot.
#[derive(Debug, Default)]
pub(crate) struct HostDeviceLedger {
    pub(crate) counts: HostResourceCounts,
    /// `"<kind> <label>"` per release, oldest first.
    pub(crate) releases: Vec<String>,
}

/// A compute device that runs native kernels on the calling thread.
///
/// Transfers are plain copies and dispatches run to completion before
/// returning, which makes this device a faithful model of the blocking,
/// in-order queue the simulation is written against.
#[derive(Debug)]
pub struct HostComputeDevice {
    descriptor: DeviceDescriptor,
    claim: Arc<AtomicBool>,
    table: Arc<HostKernelTable>,
    faults: Arc<FaultInjector>,
    stats: Arc<Mutex<HostDeviceLedger>>,

    programs: Mutex<HashMap<ProgramId, HostProgramEntry>>,
    kernels: Mutex<HashMap<KernelId, HostKernelEntry>>,
    buffers: Mutex<HashMap<BufferId, HostBufferEntry>>,

    next_program_id: AtomicUsize,
    next_kernel_id: AtomicUsize,
    next_buffer_id: AtomicUsize,
}

impl HostComputeDevice {
    pub(crate) fn new(
        descriptor: DeviceDescriptor,
        claim: Arc<AtomicBool>,
        table: Arc<HostKernelTable>,
        faults: Arc<FaultInjector>,
        stats: Arc<Mutex<HostDeviceLedger>>,
    ) -> Self {
        Self {
            descriptor,
            claim,
            table,
            faults,
            stats,
            programs: Mutex::new(HashMap::new()),
            kernels: Mutex::new(HashMap::new()),
            buffers: Mutex::new(HashMap::new()),
            next_program_id: AtomicUsize::new(0),
            next_kernel_id: AtomicUsize::new(0),
            next_buffer_id: AtomicUsize::new(0),
        }
    }

    fn publish_release(&self, kind: &str, label: &str) {
        lock(&self.stats).releases.push(format!("{kind} {label}"));
        self.publish_counts();
    }

    fn publish_counts(&self) {
        let counts = HostResourceCounts {
            programs: lock(&self.programs).len(),
            kernels: lock(&self.kernels).len(),
            buffers: lock(&self.buffers).len(),
        };
        lock(&self.stats).counts = counts;
    }

    /// Checks one buffer argument against its parameter.
    fn check_buffer_arg(
        &self,
        signature: &KernelSignature,
        binding: u32,
        id: BufferId,
        element_size: u64,
        access: BufferAccess,
    ) -> Result<(), ComputeError> {
        let fail = |reason: String| ComputeError::ArgumentBindingFailed {
            kernel: signature.entry_point.clone(),
            slot: binding,
            reason,
        };
        let buffers = lock(&self.buffers);
        let entry = buffers
            .get(&id)
            .ok_or_else(|| fail(format!("{id:?} is not a live buffer")))?;
        if entry.layout.element_size != element_size {
            return Err(fail(format!(
                "buffer '{}' has {}-byte elements, {element_size}-byte elements expected",
                entry.label, entry.layout.element_size
            )));
        }
        if access == BufferAccess::ReadWrite && entry.access != BufferAccess::ReadWrite {
            return Err(fail(format!(
                "buffer '{}' is {}, the kernel writes it",
                entry.label, entry.access
            )));
        }
        Ok(())
    }
}

impl Drop for HostComputeDevice {
    fn drop(&mut self) {
        self.claim.store(false, Ordering::Release);
        log::info!(
            "HostComputeDevice: Released device '{}'",
            self.descriptor.name
        );
    }
}

impl ComputeDevice for HostComputeDevice {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn build_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ComputeError> {
        let failed = |diagnostics: String| ComputeError::BuildFailed {
            label: descriptor.label.to_string(),
            diagnostics,
        };

        check_brackets(&descriptor.source).map_err(failed)?;
        let entry_points = compute_entry_points(&descriptor.source);
        if entry_points.is_empty() {
            return Err(failed("program declares no @compute entry point".into()));
        }
        let missing: Vec<String> = entry_points
            .iter()
            .filter(|name| !self.table.contains(name))
            .map(|name| format!("{name}: no native implementation on the host device"))
            .collect();
        if !missing.is_empty() {
            return Err(failed(missing.join("\n")));
        }

        let id = ProgramId(self.next_program_id.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "HostComputeDevice: Built program '{}' ({id:?}) with entry points {entry_points:?}",
            descriptor.label
        );
        lock(&self.programs).insert(
            id,
            HostProgramEntry {
                label: descriptor.label.to_string(),
                entry_points,
            },
        );
        self.publish_counts();
        Ok(id)
    }

    fn program_entry_points(&self, program: ProgramId) -> Result<Vec<String>, ComputeError> {
        lock(&self.programs)
            .get(&program)
            .map(|p| p.entry_points.clone())
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{program:?}")))
    }

    fn release_program(&self, id: ProgramId) -> Result<(), ComputeError> {
        let entry = lock(&self.programs)
            .remove(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        log::debug!("HostComputeDevice: Released program '{}' ({id:?})", entry.label);
        self.publish_release("program", &entry.label);
        Ok(())
    }

    fn create_kernel(
        &self,
        program: ProgramId,
        signature: &KernelSignature,
    ) -> Result<KernelId, ComputeError> {
        let label = {
            let programs = lock(&self.programs);
            let entry = programs
                .get(&program)
                .ok_or_else(|| ComputeError::InvalidHandle(format!("{program:?}")))?;
            if !entry.entry_points.contains(&signature.entry_point) {
                return Err(ComputeError::EntryPointNotFound(
                    signature.entry_point.clone(),
                ));
            }
            entry.label.clone()
        };

        let native = self
            .table
            .get(&signature.entry_point)
            .ok_or_else(|| ComputeError::EntryPointNotFound(signature.entry_point.clone()))?;
        if native.signature != *signature {
            return Err(ComputeError::BuildFailed {
                label,
                diagnostics: format!(
                    "{}: declared signature {:?} does not match the requested {:?}",
                    signature.entry_point, native.signature.params, signature.params
                ),
            });
        }

        let id = KernelId(self.next_kernel_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.kernels).insert(
            id,
            HostKernelEntry {
                signature: signature.clone(),
                run: Arc::clone(&native.run),
                args: None,
            },
        );
        log::debug!(
            "HostComputeDevice: Created kernel '{}' ({id:?})",
            signature.entry_point
        );
        self.publish_counts();
        Ok(id)
    }

    fn bind_kernel_args(&self, kernel: KernelId, args: &[KernelArg]) -> Result<(), ComputeError> {
        let signature = lock(&self.kernels)
            .get(&kernel)
            .map(|k| k.signature.clone())
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{kernel:?}")))?;

        signature
            .check_arity_and_kinds(args)
            .map_err(|(slot, reason)| ComputeError::ArgumentBindingFailed {
                kernel: signature.entry_point.clone(),
                slot,
                reason,
            })?;
        for (param, arg) in signature.params.iter().zip(args) {
            if let (
                ParamKind::Buffer {
                    element_size,
                    access,
                },
                KernelArg::Buffer(id),
            ) = (param.kind, arg)
            {
                self.check_buffer_arg(&signature, param.binding, *id, element_size, access)?;
            }
        }

        if let Some(entry) = lock(&self.kernels).get_mut(&kernel) {
            entry.args = Some(args.to_vec());
        }
        log::debug!(
            "HostComputeDevice: Bound {} arguments of kernel '{}'",
            args.len(),
            signature.entry_point
        );
        Ok(())
    }

    fn release_kernel(&self, id: KernelId) -> Result<(), ComputeError> {
        let entry = lock(&self.kernels)
            .remove(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        log::debug!(
            "HostComputeDevice: Released kernel '{}' ({id:?})",
            entry.signature.entry_point
        );
        self.publish_release("kernel", &entry.signature.entry_point);
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ComputeError> {
        if descriptor.layout.is_empty() {
            return Err(ComputeError::EmptyLayout {
                buffer: descriptor.label.to_string(),
            });
        }
        let size = descriptor.layout.size_in_bytes();
        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.buffers).insert(
            id,
            HostBufferEntry {
                label: descriptor.label.to_string(),
                layout: descriptor.layout,
                access: descriptor.access,
                data: vec![0; size as usize],
            },
        );
        log::debug!(
            "HostComputeDevice: Created buffer '{}' ({id:?}) of {size} bytes",
            descriptor.label
        );
        self.publish_counts();
        Ok(id)
    }

    fn buffer_layout(&self, id: BufferId) -> Result<BufferLayout, ComputeError> {
        lock(&self.buffers)
            .get(&id)
            .map(|b| b.layout)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))
    }

    fn release_buffer(&self, id: BufferId) -> Result<(), ComputeError> {
        let entry = lock(&self.buffers)
            .remove(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        log::debug!("HostComputeDevice: Released buffer '{}' ({id:?})", entry.label);
        self.publish_release("buffer", &entry.label);
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, data: &[u8]) -> Result<(), ComputeError> {
        let mut buffers = lock(&self.buffers);
        let entry = buffers
            .get_mut(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        check_transfer_size(&entry.label, &entry.layout, data.len())?;
        if self.faults.trip(FaultPoint::Write, &entry.label) {
            return Err(ComputeError::TransferFailed {
                buffer: entry.label.clone(),
                reason: "injected write fault".into(),
            });
        }
        entry.data.copy_from_slice(data);
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, out: &mut [u8]) -> Result<(), ComputeError> {
        let buffers = lock(&self.buffers);
        let entry = buffers
            .get(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        check_transfer_size(&entry.label, &entry.layout, out.len())?;
        if self.faults.trip(FaultPoint::Read, &entry.label) {
            return Err(ComputeError::TransferFailed {
                buffer: entry.label.clone(),
                reason: "injected read fault".into(),
            });
        }
        out.copy_from_slice(&entry.data);
        Ok(())
    }

    fn dispatch(&self, kernel: KernelId, work_items: u32) -> Result<(), ComputeError> {
        let (signature, run, args) = {
            let kernels = lock(&self.kernels);
            let entry = kernels
                .get(&kernel)
                .ok_or_else(|| ComputeError::InvalidHandle(format!("{kernel:?}")))?;
            (
                entry.signature.clone(),
                Arc::clone(&entry.run),
                entry.args.clone(),
            )
        };
        let failed = |reason: String| ComputeError::DispatchFailed {
            kernel: signature.entry_point.clone(),
            reason,
        };
        let args = args.ok_or_else(|| failed("arguments are not bound".into()))?;
        if self.faults.trip(FaultPoint::Dispatch, &signature.entry_point) {
            return Err(failed("injected dispatch fault".into()));
        }

        let mut invocation = HostInvocation::new(work_items);
        {
            let buffers = lock(&self.buffers);
            for (param, arg) in signature.params.iter().zip(&args) {
                let slot = match (param.kind, arg) {
                    (ParamKind::Buffer { access, .. }, KernelArg::Buffer(id)) => {
                        let entry = buffers
                            .get(id)
                            .ok_or_else(|| failed(format!("{id:?} was released")))?;
                        Slot::Buffer {
                            id: *id,
                            bytes: entry.data.clone(),
                            writable: access == BufferAccess::ReadWrite,
                            dirty: false,
                        }
                    }
                    (_, KernelArg::Uint(value)) => Slot::Uint(*value),
                    (_, KernelArg::Buffer(id)) => {
                        return Err(failed(format!("{id:?} bound to a scalar slot")))
                    }
                };
                invocation.slots.insert(param.binding, slot);
            }
        }

        run(&mut invocation).map_err(failed)?;

        let mut buffers = lock(&self.buffers);
        for (id, bytes) in invocation.into_written() {
            if let Some(entry) = buffers.get_mut(&id) {
                entry.data = bytes;
            }
        }
        log::trace!(
            "HostComputeDevice: Dispatched '{}' over {work_items} work items",
            signature.entry_point
        );
        Ok(())
    }
}
