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

//! Scoped ownership of device resources.

use super::api::{BufferId, KernelId, ProgramId};
use super::traits::ComputeDevice;
use crate::error::ComputeError;
use std::fmt::Debug;
use std::sync::Arc;

/// A device resource handle that knows how to release itself.
pub trait DeviceResource: Copy + Debug {
    /// Releases the resource on `device`.
    fn release_on(self, device: &dyn ComputeDevice) -> Result<(), ComputeError>;
}

impl DeviceResource for BufferId {
    fn release_on(self, device: &dyn ComputeDevice) -> Result<(), ComputeError> {
        device.release_buffer(self)
    }
}

impl DeviceResource for KernelId {
    fn release_on(self, device: &dyn ComputeDevice) -> Result<(), ComputeError> {
        device.release_kernel(self)
    }
}

impl DeviceResource for ProgramId {
    fn release_on(self, device: &dyn ComputeDevice) -> Result<(), ComputeError> {
        device.release_program(self)
    }
}

/// Owns one device resource and releases it when dropped.
///
/// The guard keeps its device alive, so a set of guards is always released
/// before the device they were created on. Struct fields drop in declaration
/// order; owners declare guards in reverse creation order to tear down the
/// way they built up.
#[derive(Debug)]
pub struct Scoped<I: DeviceResource> {
    id: I,
    device: Arc<dyn ComputeDevice>,
    released: bool,
}

impl<I: DeviceResource> Scoped<I> {
    /// Takes ownership of `id`, created on `device`.
    pub fn new(device: Arc<dyn ComputeDevice>, id: I) -> Self {
        Self {
            id,
            device,
            released: false,
        }
    }

    /// The guarded handle.
    #[inline]
    pub fn id(&self) -> I {
        self.id
    }

    /// The device the resource lives on.
    pub fn device(&self) -> &Arc<dyn ComputeDevice> {
        &self.device
    }

    /// Releases the resource now, reporting failure instead of logging it.
    pub fn release(mut self) -> Result<(), ComputeError> {
        self.released = true;
        self.id.release_on(self.device.as_ref())
    }
}

impl<I: DeviceResource> Drop for Scoped<I> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        log::debug!("Releasing {:?}", self.id);
        if let Err(e) = self.id.release_on(self.device.as_ref()) {
            log::warn!("Failed to release {:?}: {}", self.id, e);
        }
    }
}

/// A list of guards released newest first.
///
/// A `Vec` drops its elements front to back, which for guards pushed in
/// creation order would release the oldest resource first.
#[derive(Debug)]
pub struct ScopedStack<T> {
    items: Vec<T>,
}

impl<T> ScopedStack<T> {
    /// An empty stack with room for `capacity` guards.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Adds the most recently created guard.
    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }
}

impl<T> Default for ScopedStack<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> std::ops::Deref for ScopedStack<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> Drop for ScopedStack<T> {
    fn drop(&mut self) {
        while self.items.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Tracked<'a> {
        name: &'static str,
        log: &'a Mutex<Vec<&'static str>>,
    }

    impl Drop for Tracked<'_> {
        fn drop(&mut self) {
            self.log.lock().unwrap().push(self.name);
        }
    }

    #[test]
    fn stack_drops_newest_first() {
        let log = Mutex::new(Vec::new());
        {
            let mut stack = ScopedStack::with_capacity(3);
            for name in ["first", "second", "third"] {
                stack.push(Tracked { name, log: &log });
            }
            assert_eq!(stack.len(), 3);
            assert_eq!(stack[0].name, "first");
        }
        assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
    }
}
