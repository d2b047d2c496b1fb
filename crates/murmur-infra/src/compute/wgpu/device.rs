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

use super::context::WgpuComputeContext;
use super::conversions::{format_compilation_errors, storage_usages, IntoWgpu};
use crate::compute::lock;
use murmur_core::compute::source::compute_entry_points;
use murmur_core::compute::{
    check_transfer_size, BufferAccess, BufferDescriptor, BufferId, BufferLayout, ComputeDevice,
    DeviceDescriptor, KernelArg, KernelId, KernelSignature, ParamKind, ProgramDescriptor,
    ProgramId,
};
use murmur_core::ComputeError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use wgpu::util::DeviceExt;

#[derive(Debug)]
struct WgpuProgramEntry {
    label: String,
    module: wgpu::ShaderModule,
    entry_points: Vec<String>,
}

#[derive(Debug)]
struct WgpuKernelEntry {
    signature: KernelSignature,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::ComputePipeline,
    bind_group: Option<wgpu::BindGroup>,
    // Scalar arguments, one small uniform buffer each.
    uniforms: Vec<wgpu::Buffer>,
}

#[derive(Debug)]
struct WgpuBufferEntry {
    label: String,
    layout: BufferLayout,
    access: BufferAccess,
    buffer: wgpu::Buffer,
    readback: wgpu::Buffer,
}

/// A [`ComputeDevice`] backed by a WGPU logical device.
///
/// Every operation blocks until the GPU has finished it, so the queue is
/// strictly in-order from the caller's point of view.
#[derive(Debug)]
pub struct WgpuComputeDevice {
    descriptor: DeviceDescriptor,
    context: WgpuComputeContext,

    programs: Mutex<HashMap<ProgramId, WgpuProgramEntry>>,
    kernels: Mutex<HashMap<KernelId, WgpuKernelEntry>>,
    buffers: Mutex<HashMap<BufferId, WgpuBufferEntry>>,

    next_program_id: AtomicUsize,
    next_kernel_id: AtomicUsize,
    next_buffer_id: AtomicUsize,
}

impl WgpuComputeDevice {
    pub(crate) fn new(descriptor: DeviceDescriptor, context: WgpuComputeContext) -> Self {
        Self {
            descriptor,
            context,
            programs: Mutex::new(HashMap::new()),
            kernels: Mutex::new(HashMap::new()),
            buffers: Mutex::new(HashMap::new()),
            next_program_id: AtomicUsize::new(0),
            next_kernel_id: AtomicUsize::new(0),
            next_buffer_id: AtomicUsize::new(0),
        }
    }

    fn create_uniform(&self, label: &str, value: u32) -> wgpu::Buffer {
        // Padded to 16 bytes to satisfy uniform layout rules on every backend.
        self.context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&[value, 0u32, 0, 0]),
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }
}

impl Drop for WgpuComputeDevice {
    fn drop(&mut self) {
        if let Err(e) = self.context.wait_idle() {
            log::warn!("Failed to poll device during shutdown: {e}");
        }
        log::info!(
            "WgpuComputeDevice: Released device '{}'",
            self.context.adapter_name
        );
    }
}

impl ComputeDevice for WgpuComputeDevice {
    fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    fn build_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ComputeError> {
        let failed = |diagnostics: String| ComputeError::BuildFailed {
            label: descriptor.label.to_string(),
            diagnostics,
        };

        let module = self
            .context
            .validated(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(descriptor.label.as_ref()),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(descriptor.source.as_ref())),
                })
            })
            .map_err(failed)?;
        let info = pollster::block_on(module.get_compilation_info());
        if let Some(diagnostics) = format_compilation_errors(&info.messages) {
            return Err(failed(diagnostics));
        }

        let entry_points = compute_entry_points(&descriptor.source);
        if entry_points.is_empty() {
            return Err(failed("program declares no @compute entry point".into()));
        }

        let id = ProgramId(self.next_program_id.fetch_add(1, Ordering::Relaxed));
        log::info!(
            "WgpuComputeDevice: Built program '{}' ({id:?}) with entry points {entry_points:?}",
            descriptor.label
        );
        lock(&self.programs).insert(
            id,
            WgpuProgramEntry {
                label: descriptor.label.to_string(),
                module,
                entry_points,
            },
        );
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
        log::debug!(
            "WgpuComputeDevice: Released program '{}' ({id:?})",
            entry.label
        );
        Ok(())
    }

    fn create_kernel(
        &self,
        program: ProgramId,
        signature: &KernelSignature,
    ) -> Result<KernelId, ComputeError> {
        let programs = lock(&self.programs);
        let program_entry = programs
            .get(&program)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{program:?}")))?;
        if !program_entry.entry_points.contains(&signature.entry_point) {
            return Err(ComputeError::EntryPointNotFound(
                signature.entry_point.clone(),
            ));
        }

        let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = signature
            .params
            .iter()
            .map(|param| wgpu::BindGroupLayoutEntry {
                binding: param.binding,
                visibility: wgpu::ShaderStages::COMPUTE,
                ty: param.kind.into_wgpu(),
                count: None,
            })
            .collect();
        let entry_point = signature.entry_point.as_str();

        let (bind_group_layout, pipeline) = self
            .context
            .validated(|device| {
                let bind_group_layout =
                    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                        label: Some(entry_point),
                        entries: &layout_entries,
                    });
                let pipeline_layout =
                    device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some(entry_point),
                        bind_group_layouts: &[&bind_group_layout],
                        push_constant_ranges: &[],
                    });
                let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(entry_point),
                    layout: Some(&pipeline_layout),
                    module: &program_entry.module,
                    entry_point: Some(entry_point),
                    compilation_options: Default::default(),
                    cache: None,
                });
                (bind_group_layout, pipeline)
            })
            .map_err(|message| ComputeError::BuildFailed {
                label: program_entry.label.clone(),
                diagnostics: format!("{entry_point}: {message}"),
            })?;
        drop(programs);

        let id = KernelId(self.next_kernel_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.kernels).insert(
            id,
            WgpuKernelEntry {
                signature: signature.clone(),
                bind_group_layout,
                pipeline,
                bind_group: None,
                uniforms: Vec::new(),
            },
        );
        log::debug!("WgpuComputeDevice: Created kernel '{entry_point}' ({id:?})");
        Ok(id)
    }

    fn bind_kernel_args(&self, kernel: KernelId, args: &[KernelArg]) -> Result<(), ComputeError> {
        let (signature, bind_group_layout) = lock(&self.kernels)
            .get(&kernel)
            .map(|k| (k.signature.clone(), k.bind_group_layout.clone()))
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{kernel:?}")))?;
        let fail = |slot: u32, reason: String| ComputeError::ArgumentBindingFailed {
            kernel: signature.entry_point.clone(),
            slot,
            reason,
        };

        signature
            .check_arity_and_kinds(args)
            .map_err(|(slot, reason)| fail(slot, reason))?;

        let uniforms: Vec<(u32, wgpu::Buffer)> = signature
            .params
            .iter()
            .zip(args)
            .filter_map(|(param, arg)| match arg {
                KernelArg::Uint(value) => Some((
                    param.binding,
                    self.create_uniform(&signature.entry_point, *value),
                )),
                KernelArg::Buffer(_) => None,
            })
            .collect();

        let buffers = lock(&self.buffers);
        let mut entries = Vec::with_capacity(args.len());
        for (param, arg) in signature.params.iter().zip(args) {
            let resource = match (param.kind, arg) {
                (
                    ParamKind::Buffer {
                        element_size,
                        access,
                    },
                    KernelArg::Buffer(id),
                ) => {
                    let entry = buffers
                        .get(id)
                        .ok_or_else(|| fail(param.binding, format!("{id:?} is not a live buffer")))?;
                    if entry.layout.element_size != element_size {
                        return Err(fail(
                            param.binding,
                            format!(
                                "buffer '{}' has {}-byte elements, {element_size}-byte elements expected",
                                entry.label, entry.layout.element_size
                            ),
                        ));
                    }
                    if access == BufferAccess::ReadWrite && entry.access != BufferAccess::ReadWrite
                    {
                        return Err(fail(
                            param.binding,
                            format!("buffer '{}' is {}, the kernel writes it", entry.label, entry.access),
                        ));
                    }
                    entry.buffer.as_entire_binding()
                }
                (_, KernelArg::Uint(_)) => uniforms
                    .iter()
                    .find(|(binding, _)| *binding == param.binding)
                    .map(|(_, buffer)| buffer.as_entire_binding())
                    .ok_or_else(|| fail(param.binding, "scalar was not staged".into()))?,
                (_, KernelArg::Buffer(id)) => {
                    return Err(fail(
                        param.binding,
                        format!("{id:?} bound to a scalar slot"),
                    ))
                }
            };
            entries.push(wgpu::BindGroupEntry {
                binding: param.binding,
                resource,
            });
        }

        let bind_group = self
            .context
            .validated(|device| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&signature.entry_point),
                    layout: &bind_group_layout,
                    entries: &entries,
                })
            })
            .map_err(|message| fail(0, message))?;
        drop(entries);
        drop(buffers);

        if let Some(entry) = lock(&self.kernels).get_mut(&kernel) {
            entry.bind_group = Some(bind_group);
            entry.uniforms = uniforms.into_iter().map(|(_, buffer)| buffer).collect();
        }
        log::debug!(
            "WgpuComputeDevice: Bound {} arguments of kernel '{}'",
            args.len(),
            signature.entry_point
        );
        Ok(())
    }

    fn release_kernel(&self, id: KernelId) -> Result<(), ComputeError> {
        let entry = lock(&self.kernels)
            .remove(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        for uniform in &entry.uniforms {
            uniform.destroy();
        }
        log::debug!(
            "WgpuComputeDevice: Released kernel '{}' ({id:?})",
            entry.signature.entry_point
        );
        Ok(())
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ComputeError> {
        if descriptor.layout.is_empty() {
            return Err(ComputeError::EmptyLayout {
                buffer: descriptor.label.to_string(),
            });
        }
        let size = descriptor.layout.size_in_bytes();
        let label = descriptor.label.as_ref();

        let (buffer, readback) = self
            .context
            .validated(|device| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: storage_usages(),
                    mapped_at_creation: false,
                });
                let readback = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (buffer, readback)
            })
            .map_err(|reason| ComputeError::TransferFailed {
                buffer: label.to_owned(),
                reason: format!("allocation failed: {reason}"),
            })?;

        let id = BufferId(self.next_buffer_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.buffers).insert(
            id,
            WgpuBufferEntry {
                label: label.to_owned(),
                layout: descriptor.layout,
                access: descriptor.access,
                buffer,
                readback,
            },
        );
        log::info!("WgpuComputeDevice: Created buffer '{label}' with ID: {id:?}, size: {size} bytes");
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
        entry.buffer.destroy();
        entry.readback.destroy();
        log::debug!(
            "WgpuComputeDevice: Released buffer '{}' ({id:?})",
            entry.label
        );
        Ok(())
    }

    fn write_buffer(&self, id: BufferId, data: &[u8]) -> Result<(), ComputeError> {
        let buffers = lock(&self.buffers);
        let entry = buffers
            .get(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        check_transfer_size(&entry.label, &entry.layout, data.len())?;
        let fail = |reason: String| ComputeError::TransferFailed {
            buffer: entry.label.clone(),
            reason,
        };

        self.context
            .validated(|_| {
                self.context.queue.write_buffer(&entry.buffer, 0, data);
                self.context.queue.submit(std::iter::empty());
            })
            .map_err(fail)?;
        self.context.wait_idle().map_err(fail)?;

        log::trace!(
            "WgpuComputeDevice: Wrote {} bytes to buffer '{}'",
            data.len(),
            entry.label
        );
        Ok(())
    }

    fn read_buffer(&self, id: BufferId, out: &mut [u8]) -> Result<(), ComputeError> {
        let buffers = lock(&self.buffers);
        let entry = buffers
            .get(&id)
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{id:?}")))?;
        check_transfer_size(&entry.label, &entry.layout, out.len())?;
        let fail = |reason: String| ComputeError::TransferFailed {
            buffer: entry.label.clone(),
            reason,
        };

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Murmur Readback Encoder"),
                });
        encoder.copy_buffer_to_buffer(&entry.buffer, 0, &entry.readback, 0, entry.buffer.size());
        self.context.queue.submit(Some(encoder.finish()));

        let slice = entry.readback.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only goes away if this call already failed.
            let _ = sender.send(result);
        });
        self.context.wait_idle().map_err(fail)?;
        match receiver.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(fail(format!("WGPU map_async failed: {e:?}"))),
            Err(_) => return Err(fail("map_async callback never ran".into())),
        }
        {
            let view = slice.get_mapped_range();
            out.copy_from_slice(&view);
        }
        entry.readback.unmap();
        Ok(())
    }

    fn dispatch(&self, kernel: KernelId, work_items: u32) -> Result<(), ComputeError> {
        let (signature, pipeline, bind_group) = lock(&self.kernels)
            .get(&kernel)
            .map(|k| (k.signature.clone(), k.pipeline.clone(), k.bind_group.clone()))
            .ok_or_else(|| ComputeError::InvalidHandle(format!("{kernel:?}")))?;
        let failed = |reason: String| ComputeError::DispatchFailed {
            kernel: signature.entry_point.clone(),
            reason,
        };
        let bind_group = bind_group.ok_or_else(|| failed("arguments are not bound".into()))?;

        let workgroups = signature.workgroups_for(work_items);
        let max = self.context.device_limits.max_compute_workgroups_per_dimension;
        if workgroups > max {
            return Err(failed(format!(
                "{workgroups} workgroups exceed the device limit of {max}"
            )));
        }

        self.context
            .validated(|device| {
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some(&signature.entry_point),
                });
                {
                    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                        label: Some(&signature.entry_point),
                        timestamp_writes: None,
                    });
                    pass.set_pipeline(&pipeline);
                    pass.set_bind_group(0, &bind_group, &[]);
                    pass.dispatch_workgroups(workgroups, 1, 1);
                }
                self.context.queue.submit(Some(encoder.finish()));
            })
            .map_err(failed)?;
        self.context.wait_idle().map_err(failed)?;

        log::trace!(
            "WgpuComputeDevice: Dispatched '{}' as {workgroups} workgroup(s) over {work_items} work items",
            signature.entry_point
        );
        Ok(())
    }
}
