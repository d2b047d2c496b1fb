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

//! Kernel signatures: which argument slots an entry point expects.

use super::api::{BufferAccess, KernelArg};
use std::fmt;

/// The kind of value an argument slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A storage buffer of `element_size`-byte records.
    Buffer {
        /// Size of one record in bytes.
        element_size: u64,
        /// Access mode the kernel declares for the buffer.
        access: BufferAccess,
    },
    /// A 32-bit unsigned scalar.
    Uint,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Buffer {
                element_size,
                access,
            } => write!(f, "{access} buffer of {element_size}-byte elements"),
            ParamKind::Uint => f.write_str("u32"),
        }
    }
}

/// One argument slot of a kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelParam {
    /// Binding slot, unique across the whole program.
    pub binding: u32,
    /// What the slot accepts.
    pub kind: ParamKind,
}

impl KernelParam {
    /// A storage buffer parameter.
    pub const fn buffer(binding: u32, element_size: u64, access: BufferAccess) -> Self {
        Self {
            binding,
            kind: ParamKind::Buffer {
                element_size,
                access,
            },
        }
    }

    /// A `u32` scalar parameter.
    pub const fn uint(binding: u32) -> Self {
        Self {
            binding,
            kind: ParamKind::Uint,
        }
    }
}

/// The full argument list of one entry point, in argument order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelSignature {
    /// Name of the `@compute` entry point.
    pub entry_point: String,
    /// Argument slots in binding order.
    pub params: Vec<KernelParam>,
    /// Invocations per workgroup declared by the entry point.
    pub workgroup_size: u32,
}

impl KernelSignature {
    /// Creates a new signature with a workgroup size of 1.
    pub fn new(entry_point: impl Into<String>, params: Vec<KernelParam>) -> Self {
        Self {
            entry_point: entry_point.into(),
            params,
            workgroup_size: 1,
        }
    }

    /// Sets the workgroup size declared by the entry point.
    pub fn with_workgroup_size(mut self, workgroup_size: u32) -> Self {
        self.workgroup_size = workgroup_size.max(1);
        self
    }

    /// Number of workgroups needed to cover `work_items` invocations.
    pub fn workgroups_for(&self, work_items: u32) -> u32 {
        work_items.div_ceil(self.workgroup_size)
    }

    /// The parameter bound at `binding`, if any.
    pub fn param(&self, binding: u32) -> Option<&KernelParam> {
        self.params.iter().find(|p| p.binding == binding)
    }

    /// Checks the shape of an argument list against this signature, ignoring
    /// buffer contents. Buffer properties are checked by the device, which is
    /// the only one that knows them.
    ///
    /// Returns `(slot, reason)` for the first argument that does not fit.
    pub fn check_arity_and_kinds(&self, args: &[KernelArg]) -> Result<(), (u32, String)> {
        if args.len() != self.params.len() {
            let slot = self
                .params
                .get(args.len())
                .or(self.params.last())
                .map_or(0, |p| p.binding);
            return Err((
                slot,
                format!(
                    "expected {} arguments, got {}",
                    self.params.len(),
                    args.len()
                ),
            ));
        }
        for (param, arg) in self.params.iter().zip(args) {
            match (param.kind, arg) {
                (ParamKind::Buffer { .. }, KernelArg::Buffer(_))
                | (ParamKind::Uint, KernelArg::Uint(_)) => {}
                (kind, _) => {
                    return Err((param.binding, format!("expected {kind}, got {arg:?}")));
                }
            }
        }
        Ok(())
    }
}
