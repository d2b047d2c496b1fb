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

//! Defines the hierarchy of error types for device setup and simulation ticks.

use crate::flocking::RuleKind;
use std::fmt;

/// An error raised by a compute backend or device.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputeError {
    /// Platform enumeration returned nothing.
    NoPlatformsFound,
    /// The chosen platform exposes no compute-capable device.
    NoDevicesFound {
        /// Name of the platform that was enumerated.
        platform: String,
    },
    /// A platform or device index outside the enumerated range.
    SelectionOutOfRange {
        /// Either `"platform"` or `"device"`.
        what: &'static str,
        /// The requested index.
        index: usize,
        /// How many entries were available.
        available: usize,
    },
    /// The chosen device exists but cannot be bound.
    DeviceUnavailable {
        /// Name of the device.
        device: String,
        /// Why binding failed.
        reason: String,
    },
    /// The program failed to build. `diagnostics` carries the compiler log verbatim.
    BuildFailed {
        /// Label of the program.
        label: String,
        /// The compiler's diagnostic log.
        diagnostics: String,
    },
    /// A requested entry point is absent from the program.
    EntryPointNotFound(String),
    /// An argument did not fit the kernel's slot.
    ArgumentBindingFailed {
        /// Entry point of the kernel.
        kernel: String,
        /// Binding slot that was rejected.
        slot: u32,
        /// What did not match.
        reason: String,
    },
    /// A host/device transfer failed.
    TransferFailed {
        /// Label of the buffer involved.
        buffer: String,
        /// Backend-specific reason.
        reason: String,
    },
    /// A kernel dispatch failed.
    DispatchFailed {
        /// Entry point of the kernel.
        kernel: String,
        /// Backend-specific reason.
        reason: String,
    },
    /// A host array does not have the byte size of the buffer mirroring it.
    BufferSizeMismatch {
        /// Label of the buffer.
        buffer: String,
        /// Size of the device buffer in bytes.
        expected: u64,
        /// Size of the host array in bytes.
        actual: u64,
    },
    /// A buffer layout describing zero bytes.
    EmptyLayout {
        /// Label of the buffer.
        buffer: String,
    },
    /// A handle that does not refer to a live resource of this device.
    InvalidHandle(String),
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeError::NoPlatformsFound => write!(f, "No compute platforms found"),
            ComputeError::NoDevicesFound { platform } => {
                write!(f, "No compute-capable devices found on platform '{platform}'")
            }
            ComputeError::SelectionOutOfRange {
                what,
                index,
                available,
            } => write!(
                f,
                "Selected {what} index {index} is out of range ({available} available)"
            ),
            ComputeError::DeviceUnavailable { device, reason } => {
                write!(f, "Device '{device}' is unavailable: {reason}")
            }
            ComputeError::BuildFailed { label, diagnostics } => {
                write!(f, "Program '{label}' failed to build:\n{diagnostics}")
            }
            ComputeError::EntryPointNotFound(name) => {
                write!(f, "Entry point '{name}' not found in program")
            }
            ComputeError::ArgumentBindingFailed {
                kernel,
                slot,
                reason,
            } => write!(
                f,
                "Failed to bind argument slot {slot} of kernel '{kernel}': {reason}"
            ),
            ComputeError::TransferFailed { buffer, reason } => {
                write!(f, "Transfer of buffer '{buffer}' failed: {reason}")
            }
            ComputeError::DispatchFailed { kernel, reason } => {
                write!(f, "Dispatch of kernel '{kernel}' failed: {reason}")
            }
            ComputeError::BufferSizeMismatch {
                buffer,
                expected,
                actual,
            } => write!(
                f,
                "Host array of {actual} bytes does not match buffer '{buffer}' of {expected} bytes"
            ),
            ComputeError::EmptyLayout { buffer } => {
                write!(f, "Buffer '{buffer}' would hold zero bytes")
            }
            ComputeError::InvalidHandle(what) => write!(f, "Invalid handle: {what}"),
        }
    }
}

impl std::error::Error for ComputeError {}

/// The step of a tick during which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickPhase {
    /// Writing the current swarm and predators to the device.
    StagingIn,
    /// Running one rule kernel.
    Dispatching {
        /// The rule being dispatched.
        rule: RuleKind,
    },
    /// Reading results back. `None` is the final next-swarm read.
    StagingOut {
        /// The rule whose output is read, or `None` for the next swarm.
        rule: Option<RuleKind>,
    },
    /// Running the integration kernel.
    Integrating,
}

impl fmt::Display for TickPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickPhase::StagingIn => write!(f, "staging in"),
            TickPhase::Dispatching { rule } => write!(f, "dispatching {rule}"),
            TickPhase::StagingOut { rule: Some(rule) } => {
                write!(f, "staging out {rule}")
            }
            TickPhase::StagingOut { rule: None } => write!(f, "staging out next swarm"),
            TickPhase::Integrating => write!(f, "integrating"),
        }
    }
}

/// A tick that was aborted. The committed simulation state is unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TickError {
    /// Number of the tick that failed (0-based).
    pub tick: u64,
    /// Step during which it failed.
    pub phase: TickPhase,
    /// The underlying device failure.
    pub reason: ComputeError,
}

impl fmt::Display for TickError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tick {} failed while {}: {}",
            self.tick, self.phase, self.reason
        )
    }
}

impl std::error::Error for TickError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}

/// An error that aborts engine setup.
#[derive(Debug, Clone, PartialEq)]
pub enum SetupError {
    /// The configuration was rejected before touching any device.
    InvalidConfig(String),
    /// A device-level setup step failed.
    Compute(ComputeError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
            SetupError::Compute(err) => write!(f, "Compute setup failed: {err}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Compute(err) => Some(err),
            SetupError::InvalidConfig(_) => None,
        }
    }
}

impl From<ComputeError> for SetupError {
    fn from(err: ComputeError) -> Self {
        SetupError::Compute(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn build_failure_keeps_diagnostics_verbatim() {
        let err = ComputeError::BuildFailed {
            label: "flocking".into(),
            diagnostics: "3:7: expected ';'".into(),
        };
        assert!(err.to_string().ends_with("\n3:7: expected ';'"));
    }

    #[test]
    fn tick_error_chains_its_reason() {
        let err = TickError {
            tick: 4,
            phase: TickPhase::StagingOut {
                rule: Some(RuleKind::VelocityMatching),
            },
            reason: ComputeError::TransferFailed {
                buffer: "rule_3_output".into(),
                reason: "injected".into(),
            },
        };
        let message = err.to_string();
        assert!(message.contains("Tick 4"));
        assert!(message.contains("rule_3"));
        assert!(err.source().is_some());
    }

    #[test]
    fn setup_error_wraps_compute_error() {
        let err: SetupError = ComputeError::NoPlatformsFound.into();
        assert_eq!(err, SetupError::Compute(ComputeError::NoPlatformsFound));
    }
}
