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

//! The argument view a native host kernel runs against.

use bytemuck::Pod;
use murmur_core::compute::BufferId;
use std::collections::BTreeMap;

#[derive(Debug)]
pub(crate) enum Slot {
    Buffer {
        id: BufferId,
        bytes: Vec<u8>,
        writable: bool,
        dirty: bool,
    },
    Uint(u32),
}

/// Snapshot of a kernel's bound arguments for one dispatch.
///
/// Buffers are copied in before the kernel runs and writable ones are copied
/// back once it returns successfully, so a failing kernel never leaves a
/// buffer half written.
#[derive(Debug)]
pub struct HostInvocation {
    work_items: u32,
    pub(crate) slots: BTreeMap<u32, Slot>,
}

impl HostInvocation {
    pub(crate) fn new(work_items: u32) -> Self {
        Self {
            work_items,
            slots: BTreeMap::new(),
        }
    }

    /// Number of invocations requested by the dispatch.
    pub fn work_items(&self) -> u32 {
        self.work_items
    }

    /// The scalar bound at `binding`.
    pub fn uint(&self, binding: u32) -> Result<u32, String> {
        match self.slots.get(&binding) {
            Some(Slot::Uint(value)) => Ok(*value),
            Some(Slot::Buffer { .. }) => Err(format!("binding {binding} is a buffer, not a u32")),
            None => Err(format!("binding {binding} is not bound")),
        }
    }

    /// Copies the buffer bound at `binding` out as a vector of `T`.
    pub fn read<T: Pod>(&self, binding: u32) -> Result<Vec<T>, String> {
        match self.slots.get(&binding) {
            Some(Slot::Buffer { bytes, .. }) => {
                let size = std::mem::size_of::<T>();
                if size == 0 || bytes.len() % size != 0 {
                    return Err(format!(
                        "binding {binding} holds {} bytes, not a whole number of {size}-byte elements",
                        bytes.len(),
                    ));
                }
                let mut values = vec![T::zeroed(); bytes.len() / size];
                bytemuck::cast_slice_mut::<T, u8>(&mut values).copy_from_slice(bytes);
                Ok(values)
            }
            Some(Slot::Uint(_)) => Err(format!("binding {binding} is a u32, not a buffer")),
            None => Err(format!("binding {binding} is not bound")),
        }
    }

    /// Overwrites the start of the buffer bound at `binding` with `values`.
    pub fn write<T: Pod>(&mut self, binding: u32, values: &[T]) -> Result<(), String> {
        match self.slots.get_mut(&binding) {
            Some(Slot::Buffer {
                bytes,
                writable,
                dirty,
                ..
            }) => {
                if !*writable {
                    return Err(format!("binding {binding} is read-only"));
                }
                let src: &[u8] = bytemuck::cast_slice(values);
                if src.len() > bytes.len() {
                    return Err(format!(
                        "writing {} bytes overflows binding {binding} of {} bytes",
                        src.len(),
                        bytes.len()
                    ));
                }
                bytes[..src.len()].copy_from_slice(src);
                *dirty = true;
                Ok(())
            }
            Some(Slot::Uint(_)) => Err(format!("binding {binding} is a u32, not a buffer")),
            None => Err(format!("binding {binding} is not bound")),
        }
    }

    /// Buffers the kernel wrote, with their final contents.
    pub(crate) fn into_written(self) -> impl Iterator<Item = (BufferId, Vec<u8>)> {
        self.slots.into_values().filter_map(|slot| match slot {
            Slot::Buffer {
                id,
                bytes,
                dirty: true,
                ..
            } => Some((id, bytes)),
            _ => None,
        })
    }
}
