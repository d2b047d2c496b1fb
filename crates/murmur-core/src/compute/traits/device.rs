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

use crate::compute::api::{
    BufferDescriptor, BufferId, BufferLayout, DeviceDescriptor, KernelArg, KernelId, ProgramDescriptor,
    ProgramId,
};
use crate::compute::signature::KernelSignature;
use crate::error::ComputeError;
use std::fmt::Debug;

/// A resolved execution context bound to exactly one device, with an in-order queue.
///
/// This trait abstracts the resource lifecycle and the blocking command
/// submission of a compute device. Every transfer and dispatch call returns
/// only once the device has completed the work, so callers can sequence a
/// tick with plain function calls.
///
/// Handles are plain ids. Releasing one twice, or using one after release,
/// is reported as [`ComputeError::InvalidHandle`].
pub trait ComputeDevice: Send + Sync + Debug {
    /// Information about the bound device.
    fn descriptor(&self) -> &DeviceDescriptor;

    // --- Programs ---

    /// Compiles a program from source text.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - The label and the WGSL source of the program.
    ///
    /// # Returns
    ///
    /// The id of the built program, whose entry points can then be listed
    /// with [`program_entry_points`](ComputeDevice::program_entry_points).
    ///
    /// # Errors
    ///
    /// [`ComputeError::BuildFailed`] with the compiler's diagnostics verbatim.
    fn build_program(&self, descriptor: &ProgramDescriptor) -> Result<ProgramId, ComputeError>;

    /// Names of the `@compute` entry points the program declares.
    fn program_entry_points(&self, program: ProgramId) -> Result<Vec<String>, ComputeError>;

    /// Releases a program. Kernels already created from it stay valid.
    fn release_program(&self, id: ProgramId) -> Result<(), ComputeError>;

    // --- Kernels ---

    /// Creates a kernel for `signature.entry_point` of `program`.
    ///
    /// # Errors
    ///
    /// [`ComputeError::EntryPointNotFound`] if the entry point is absent, and
    /// [`ComputeError::BuildFailed`] if it is present but does not fit the
    /// signature.
    fn create_kernel(
        &self,
        program: ProgramId,
        signature: &KernelSignature,
    ) -> Result<KernelId, ComputeError>;

    /// Binds the kernel's argument slots, in signature order.
    ///
    /// Validation is eager: a wrong arity, kind, element size or access mode
    /// fails here with [`ComputeError::ArgumentBindingFailed`].
    fn bind_kernel_args(&self, kernel: KernelId, args: &[KernelArg]) -> Result<(), ComputeError>;

    /// Releases a kernel.
    fn release_kernel(&self, id: KernelId) -> Result<(), ComputeError>;

    // --- Buffers ---

    /// Allocates a buffer. Its size is fixed for its whole lifetime.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ComputeError>;

    /// The layout the buffer was allocated with.
    fn buffer_layout(&self, id: BufferId) -> Result<BufferLayout, ComputeError>;

    /// Releases a buffer.
    fn release_buffer(&self, id: BufferId) -> Result<(), ComputeError>;

    /// Copies `data` into the buffer, returning once the device holds it.
    ///
    /// # Arguments
    ///
    /// * `id` - The destination buffer.
    /// * `data` - Host bytes, exactly the buffer's size.
    ///
    /// # Errors
    ///
    /// [`ComputeError::BufferSizeMismatch`] for any other length, and
    /// [`ComputeError::TransferFailed`] if the device rejects the copy.
    fn write_buffer(&self, id: BufferId, data: &[u8]) -> Result<(), ComputeError>;

    /// Copies the buffer into `out`, returning once host memory is up to date.
    ///
    /// `out` must have exactly the buffer's size.
    fn read_buffer(&self, id: BufferId, out: &mut [u8]) -> Result<(), ComputeError>;

    // --- Execution ---

    /// Runs `kernel` over `work_items` invocations and waits for completion.
    ///
    /// # Arguments
    ///
    /// * `kernel` - A kernel whose arguments have all been bound.
    /// * `work_items` - Number of invocations, usually the swarm size.
    ///
    /// # Errors
    ///
    /// [`ComputeError::DispatchFailed`] if arguments are missing or the
    /// device fails to run the kernel.
    fn dispatch(&self, kernel: KernelId, work_items: u32) -> Result<(), ComputeError>;
}

/// Checks that a host array of `actual` bytes can be transferred to or from
/// a buffer laid out as `layout`.
pub fn check_transfer_size(
    label: &str,
    layout: &BufferLayout,
    actual: usize,
) -> Result<(), ComputeError> {
    let expected = layout.size_in_bytes();
    if expected != actual as u64 {
        return Err(ComputeError::BufferSizeMismatch {
            buffer: label.to_owned(),
            expected,
            actual: actual as u64,
        });
    }
    Ok(())
}
