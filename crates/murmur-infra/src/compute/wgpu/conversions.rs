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

use murmur_core::compute::{BufferAccess, ComputeDeviceType, ParamKind};

/// A local extension trait to convert compute types into WGPU types.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a WGPU-compatible type.
    fn into_wgpu(self) -> T;
}

/// Backends probed by the WGPU compute backend, in platform order.
pub const PROBED_BACKENDS: [wgpu::Backend; 5] = [
    wgpu::Backend::Vulkan,
    wgpu::Backend::Metal,
    wgpu::Backend::Dx12,
    wgpu::Backend::Gl,
    wgpu::Backend::BrowserWebGpu,
];

/// Returns a human-readable name for a backend.
pub fn backend_name(backend: wgpu::Backend) -> &'static str {
    match backend {
        wgpu::Backend::Vulkan => "Vulkan",
        wgpu::Backend::Metal => "Metal",
        wgpu::Backend::Dx12 => "DirectX 12",
        wgpu::Backend::Gl => "OpenGL",
        wgpu::Backend::BrowserWebGpu => "WebGPU",
        wgpu::Backend::Noop => "No-op",
    }
}

/// Converts a WGPU device type to the compute device type.
pub fn from_wgpu_device_type(device_type: wgpu::DeviceType) -> ComputeDeviceType {
    match device_type {
        wgpu::DeviceType::IntegratedGpu => ComputeDeviceType::IntegratedGpu,
        wgpu::DeviceType::DiscreteGpu => ComputeDeviceType::DiscreteGpu,
        wgpu::DeviceType::VirtualGpu => ComputeDeviceType::VirtualGpu,
        wgpu::DeviceType::Cpu => ComputeDeviceType::Cpu,
        wgpu::DeviceType::Other => ComputeDeviceType::Unknown,
    }
}

impl IntoWgpu<wgpu::BindingType> for ParamKind {
    fn into_wgpu(self) -> wgpu::BindingType {
        let ty = match self {
            ParamKind::Buffer { access, .. } => wgpu::BufferBindingType::Storage {
                read_only: access == BufferAccess::ReadOnly,
            },
            ParamKind::Uint => wgpu::BufferBindingType::Uniform,
        };
        wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        }
    }
}

/// Usages of every simulation buffer. All of them may be bound as storage,
/// written from the host, and copied back out for readback.
pub fn storage_usages() -> wgpu::BufferUsages {
    wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::COPY_SRC
}

/// Formats shader compiler messages as `line:column: message` lines.
///
/// Returns `None` when no message is an error.
pub fn format_compilation_errors(messages: &[wgpu::CompilationMessage]) -> Option<String> {
    let lines: Vec<String> = messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| match &m.location {
            Some(location) => format!(
                "{}:{}: {}",
                location.line_number, location.line_position, m.message
            ),
            None => m.message.clone(),
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(
        message_type: wgpu::CompilationMessageType,
        text: &str,
        location: Option<(u32, u32)>,
    ) -> wgpu::CompilationMessage {
        wgpu::CompilationMessage {
            message: text.to_owned(),
            message_type,
            location: location.map(|(line_number, line_position)| wgpu::SourceLocation {
                line_number,
                line_position,
                offset: 0,
                length: 1,
            }),
        }
    }

    #[test]
    fn compilation_errors_keep_their_location() {
        let messages = [
            message(wgpu::CompilationMessageType::Warning, "unused", Some((1, 1))),
            message(
                wgpu::CompilationMessageType::Error,
                "expected `;`",
                Some((12, 7)),
            ),
            message(wgpu::CompilationMessageType::Error, "bad module", None),
        ];
        assert_eq!(
            format_compilation_errors(&messages).as_deref(),
            Some("12:7: expected `;`\nbad module")
        );
    }

    #[test]
    fn warnings_alone_are_not_a_failure() {
        let messages = [message(
            wgpu::CompilationMessageType::Warning,
            "unused",
            None,
        )];
        assert_eq!(format_compilation_errors(&messages), None);
    }

    #[test]
    fn read_only_buffers_bind_as_read_only_storage() {
        let kind = ParamKind::Buffer {
            element_size: 16,
            access: BufferAccess::ReadOnly,
        };
        assert!(matches!(
            kind.into_wgpu(),
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
        assert!(matches!(
            ParamKind::Uint.into_wgpu(),
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
    }

    #[test]
    fn device_types_map_across() {
        assert_eq!(
            from_wgpu_device_type(wgpu::DeviceType::DiscreteGpu),
            ComputeDeviceType::DiscreteGpu
        );
        assert_eq!(
            from_wgpu_device_type(wgpu::DeviceType::Other),
            ComputeDeviceType::Unknown
        );
        assert_eq!(backend_name(wgpu::Backend::Vulkan), "Vulkan");
    }
}
