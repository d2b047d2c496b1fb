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

use anyhow::Result;
use approx::assert_relative_eq;
use murmur_core::compute::{
    BufferAccess, BufferDescriptor, BufferId, BufferLayout, ComputeBackend, ComputeDevice,
    DeviceSelection, KernelArg, KernelSignature, ProgramDescriptor, Scoped,
};
use murmur_core::flocking::{rule_signature, FieldBounds, FlockingParams, RuleKind};
use murmur_core::{Agent, ComputeError, Vec2};
use murmur_infra::{HostComputeBackend, HostKernelTable, HostPlatform};
use std::sync::Arc;

const STUB_PROGRAM: &str = r#"
@compute @workgroup_size(64) fn rule_1(@builtin(global_invocation_id) id: vec3<u32>) {}
@compute @workgroup_size(64) fn rule_2(@builtin(global_invocation_id) id: vec3<u32>) {}
@compute @workgroup_size(64) fn rule_3(@builtin(global_invocation_id) id: vec3<u32>) {}
@compute @workgroup_size(64) fn rule_4(@builtin(global_invocation_id) id: vec3<u32>) {}
@compute @workgroup_size(64) fn rule_5(@builtin(global_invocation_id) id: vec3<u32>) {}
@compute @workgroup_size(64) fn single_step(@builtin(global_invocation_id) id: vec3<u32>) {}
"#;

fn backend() -> HostComputeBackend {
    HostComputeBackend::new(HostKernelTable::flocking(
        FlockingParams::default(),
        FieldBounds::default(),
    ))
}

fn program(label: &str, source: &str) -> ProgramDescriptor<'static> {
    ProgramDescriptor {
        label: label.to_owned().into(),
        source: source.to_owned().into(),
    }
}

fn buffer(
    device: &Arc<dyn ComputeDevice>,
    label: &str,
    layout: BufferLayout,
    access: BufferAccess,
) -> Result<Scoped<BufferId>> {
    let id = device.create_buffer(&BufferDescriptor {
        label: label.to_owned().into(),
        layout,
        access,
    })?;
    Ok(Scoped::new(Arc::clone(device), id))
}

#[test]
fn a_device_is_claimed_until_dropped() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    assert!(backend.is_claimed(0, 0));

    let second = backend.resolve(DeviceSelection::default());
    assert!(matches!(
        second,
        Err(ComputeError::DeviceUnavailable { .. })
    ));

    drop(device);
    assert!(!backend.is_claimed(0, 0));
    backend.resolve(DeviceSelection::default())?;
    Ok(())
}

#[test]
fn selection_errors_follow_the_topology() {
    let backend = HostComputeBackend::with_topology(
        HostKernelTable::new(),
        vec![
            HostPlatform::new("Empty", &[]),
            HostPlatform::new("Pair", &["a", "b"]),
        ],
    );
    assert_eq!(
        backend.resolve(DeviceSelection::new(0, 0)).unwrap_err(),
        ComputeError::NoDevicesFound {
            platform: "Empty".into()
        }
    );
    assert!(matches!(
        backend.resolve(DeviceSelection::new(1, 2)).unwrap_err(),
        ComputeError::SelectionOutOfRange {
            what: "device",
            index: 2,
            available: 2
        }
    ));
    assert!(backend.resolve(DeviceSelection::new(1, 1)).is_ok());
}

#[test]
fn malformed_programs_report_diagnostics() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;

    let err = device
        .build_program(&program("broken", "@compute fn rule_1() {\n"))
        .unwrap_err();
    match err {
        ComputeError::BuildFailed { label, diagnostics } => {
            assert_eq!(label, "broken");
            assert!(diagnostics.contains("1:22"), "{diagnostics}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = device
        .build_program(&program("unknown", "@compute fn mystery() {}"))
        .unwrap_err();
    assert!(matches!(err, ComputeError::BuildFailed { .. }));
    Ok(())
}

#[test]
fn missing_entry_points_are_named() -> Result<()> {
    let source = STUB_PROGRAM.replace("fn rule_4", "fn rule_four");
    let table = HostKernelTable::flocking(FlockingParams::default(), FieldBounds::default())
        .with_kernel(KernelSignature::new("rule_four", Vec::new()), |_| Ok(()));
    let backend = HostComputeBackend::new(table);
    let device = backend.resolve(DeviceSelection::default())?;

    let program = device.build_program(&program("flocking", &source))?;
    let err = device
        .create_kernel(program, &rule_signature(RuleKind::BoundaryAvoidance))
        .unwrap_err();
    assert_eq!(err, ComputeError::EntryPointNotFound("rule_4".into()));
    Ok(())
}

#[test]
fn transfers_must_match_the_layout() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    let swarm = buffer(
        &device,
        "swarm",
        BufferLayout::of::<Agent>(4),
        BufferAccess::ReadOnly,
    )?;

    let err = device.write_buffer(swarm.id(), &[0u8; 48]).unwrap_err();
    assert_eq!(
        err,
        ComputeError::BufferSizeMismatch {
            buffer: "swarm".into(),
            expected: 64,
            actual: 48
        }
    );

    let mut out = [0u8; 80];
    assert!(matches!(
        device.read_buffer(swarm.id(), &mut out),
        Err(ComputeError::BufferSizeMismatch { .. })
    ));

    let err = device
        .create_buffer(&BufferDescriptor {
            label: "nothing".into(),
            layout: BufferLayout::of::<Agent>(0),
            access: BufferAccess::ReadWrite,
        })
        .unwrap_err();
    assert!(matches!(err, ComputeError::EmptyLayout { .. }));
    Ok(())
}

#[test]
fn arguments_are_checked_against_the_signature() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    let program = device.build_program(&program("flocking", STUB_PROGRAM))?;
    let kernel = device.create_kernel(program, &rule_signature(RuleKind::Cohesion))?;

    let swarm = buffer(
        &device,
        "swarm",
        BufferLayout::of::<Agent>(2),
        BufferAccess::ReadOnly,
    )?;
    let wrong = buffer(
        &device,
        "wrong",
        BufferLayout::of::<Agent>(2),
        BufferAccess::ReadWrite,
    )?;

    let err = device
        .bind_kernel_args(
            kernel,
            &[KernelArg::Buffer(swarm.id()), KernelArg::Uint(2)],
        )
        .unwrap_err();
    assert!(matches!(err, ComputeError::ArgumentBindingFailed { .. }));

    let err = device
        .bind_kernel_args(
            kernel,
            &[
                KernelArg::Buffer(swarm.id()),
                KernelArg::Uint(2),
                KernelArg::Buffer(wrong.id()),
            ],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ComputeError::ArgumentBindingFailed { slot: 2, .. }
    ));

    assert!(matches!(
        device.dispatch(kernel, 2),
        Err(ComputeError::DispatchFailed { .. })
    ));
    Ok(())
}

#[test]
fn dispatch_runs_the_native_rule() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    let program = device.build_program(&program("flocking", STUB_PROGRAM))?;
    let kernel = device.create_kernel(program, &rule_signature(RuleKind::Cohesion))?;

    let swarm = buffer(
        &device,
        "swarm",
        BufferLayout::of::<Agent>(2),
        BufferAccess::ReadOnly,
    )?;
    let output = buffer(
        &device,
        "rule_1_output",
        BufferLayout::of::<Vec2>(2),
        BufferAccess::ReadWrite,
    )?;
    let agents = [
        Agent::at_rest(Vec2::new(0.0, 0.0)),
        Agent::at_rest(Vec2::new(10.0, 0.0)),
    ];
    device.write_buffer(swarm.id(), bytemuck::cast_slice(&agents))?;
    device.bind_kernel_args(
        kernel,
        &[
            KernelArg::Buffer(swarm.id()),
            KernelArg::Uint(2),
            KernelArg::Buffer(output.id()),
        ],
    )?;
    device.dispatch(kernel, 2)?;

    let mut result = [Vec2::ZERO; 2];
    device.read_buffer(output.id(), bytemuck::cast_slice_mut(&mut result))?;
    assert_relative_eq!(result[0].x, 0.1);
    assert_relative_eq!(result[1].x, -0.1);
    assert_relative_eq!(result[0].y, 0.0);
    Ok(())
}

#[test]
fn injected_faults_surface_as_transfer_errors() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    let output = buffer(
        &device,
        "rule_3_output",
        BufferLayout::of::<Vec2>(1),
        BufferAccess::ReadWrite,
    )?;

    backend.faults().fail_next_read("rule_3_output");
    let mut out = [0u8; 8];
    assert!(matches!(
        device.read_buffer(output.id(), &mut out),
        Err(ComputeError::TransferFailed { .. })
    ));
    device.read_buffer(output.id(), &mut out)?;
    Ok(())
}

#[test]
fn released_resources_leave_no_trace() -> Result<()> {
    let backend = backend();
    let device = backend.resolve(DeviceSelection::default())?;
    {
        let program_id = device.build_program(&program("flocking", STUB_PROGRAM))?;
        let program = Scoped::new(Arc::clone(&device), program_id);
        let kernel_id = device.create_kernel(program.id(), &rule_signature(RuleKind::Separation))?;
        let _kernel = Scoped::new(Arc::clone(&device), kernel_id);
        let _swarm = buffer(
            &device,
            "swarm",
            BufferLayout::of::<Agent>(3),
            BufferAccess::ReadOnly,
        )?;

        let counts = backend.resource_counts(0, 0).unwrap_or_default();
        assert_eq!((counts.programs, counts.kernels, counts.buffers), (1, 1, 1));
    }
    assert!(backend
        .resource_counts(0, 0)
        .is_some_and(|counts| counts.is_empty()));
    Ok(())
}
