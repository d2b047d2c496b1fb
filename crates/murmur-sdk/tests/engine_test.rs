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
use murmur_core::compute::ComputeBackend;
use murmur_core::{ComputeError, SpeedLimiter};
use murmur_infra::{HostComputeBackend, HostKernelTable};
use murmur_lanes::shaders::flocking_program_source;
use murmur_lanes::simulation_lane::hunt;
use murmur_sdk::prelude::*;

fn host_config(swarm_size: usize, predator_count: usize) -> SimulationConfig {
    SimulationConfig {
        swarm_size,
        predator_count,
        seed: Some(1234),
        backend: BackendKind::Host,
        ..SimulationConfig::default()
    }
}

fn flocking_backend(config: &SimulationConfig) -> HostComputeBackend {
    HostComputeBackend::new(HostKernelTable::flocking(config.flocking, config.field))
}

fn table_with_constant_rules(config: &SimulationConfig, values: [Vec2; 5]) -> HostKernelTable {
    RuleKind::ALL
        .into_iter()
        .zip(values)
        .fold(
            HostKernelTable::flocking(config.flocking, config.field),
            |table, (rule, value)| table.with_constant_rule(rule, value),
        )
}

#[test]
fn the_swarm_keeps_its_size_across_ticks() -> Result<()> {
    let config = host_config(24, 2);
    let backend = flocking_backend(&config);
    let mut engine = SimulationEngine::new(config, &backend)?;

    for tick in 1..=20 {
        engine.tick()?;
        assert_eq!(engine.current_swarm().len(), 24);
        assert_eq!(engine.current_predators().len(), 2);
        assert_eq!(engine.ticks_completed(), tick);
    }
    assert_eq!(engine.stats().completed, 20);
    assert_eq!(engine.stats().failed, 0);
    Ok(())
}

#[test]
fn a_lone_member_at_rest_stays_put() -> Result<()> {
    let config = host_config(1, 0);
    let backend = flocking_backend(&config);
    let start = Agent::at_rest(Vec2::new(300.0, 300.0));
    let mut engine = SimulationEngine::builder(config)
        .with_initial_state(Swarm::from_agents(vec![start]), Vec::new())
        .build(&backend)?;

    for _ in 0..10 {
        engine.tick()?;
    }
    assert_eq!(engine.current_swarm()[0], start);
    assert!(engine.current_predator().is_none());
    Ok(())
}

#[test]
fn integration_damps_fast_members_instead_of_clamping() -> Result<()> {
    let mut config = host_config(1, 0);
    config.flocking.integration_scale = 1.0;
    config.flocking.speed_limit = SpeedLimiter::new(0.2, 10.0);
    let table = table_with_constant_rules(
        &config,
        [
            Vec2::new(0.35, 0.0),
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
            Vec2::ZERO,
        ],
    );
    let backend = HostComputeBackend::new(table);
    let mut engine = SimulationEngine::builder(config)
        .with_initial_state(
            Swarm::from_agents(vec![Agent::at_rest(Vec2::new(100.0, 100.0))]),
            Vec::new(),
        )
        .build(&backend)?;

    engine.tick()?;
    let member = engine.current_swarm()[0];
    assert_relative_eq!(member.velocity.x, 0.035, epsilon = 1e-6);
    assert_relative_eq!(member.velocity.y, 0.0);
    assert_relative_eq!(member.position.x, 100.035, epsilon = 1e-4);
    assert_relative_eq!(engine.rule_output(RuleKind::Cohesion)[0].x, 0.35);
    Ok(())
}

#[test]
fn zero_rules_leave_velocities_unchanged() -> Result<()> {
    let config = host_config(3, 1);
    let backend = HostComputeBackend::new(table_with_constant_rules(&config, [Vec2::ZERO; 5]));
    let swarm = Swarm::from_agents(vec![
        Agent::new(Vec2::new(50.0, 50.0), Vec2::new(0.4, -0.1)),
        Agent::new(Vec2::new(52.0, 50.0), Vec2::new(-0.2, 0.3)),
        Agent::new(Vec2::new(400.0, 10.0), Vec2::new(0.0, 0.5)),
    ]);
    let mut engine = SimulationEngine::builder(config)
        .with_initial_state(swarm.clone(), vec![Agent::default()])
        .build(&backend)?;

    engine.tick()?;
    for (before, after) in swarm.iter().zip(engine.current_swarm()) {
        assert_eq!(after.velocity, before.velocity);
        assert_eq!(after.position, before.position + before.velocity);
    }
    Ok(())
}

#[test]
fn predators_chase_the_nearest_committed_member() -> Result<()> {
    let config = host_config(16, 3);
    let predator_params = config.predator;
    let backend = flocking_backend(&config);
    let mut engine = SimulationEngine::new(config, &backend)?;

    for _ in 0..15 {
        let before = engine.current_predators().to_vec();
        engine.tick()?;
        let swarm = engine.current_swarm();
        for (old, new) in before.iter().zip(engine.current_predators()) {
            assert_eq!(*new, hunt::pursue(*old, swarm, &predator_params));
            assert!(swarm.nearest_to(old.position).is_some());
        }
    }
    Ok(())
}

#[test]
fn seeded_runs_are_reproducible() -> Result<()> {
    let run = || -> Result<Swarm> {
        let config = host_config(12, 1);
        let backend = flocking_backend(&config);
        let mut engine = SimulationEngine::new(config, &backend)?;
        for _ in 0..10 {
            engine.tick()?;
        }
        Ok(engine.current_swarm().clone())
    };
    assert_eq!(run()?, run()?);
    Ok(())
}

#[test]
fn failed_ticks_commit_nothing_and_can_be_retried() -> Result<()> {
    let config = host_config(8, 1);
    let backend = flocking_backend(&config);
    let mut engine = SimulationEngine::new(config, &backend)?;
    engine.tick()?;
    let committed = engine.state().clone();

    backend.faults().fail_next_read("rule_3_output");
    let err = engine.tick().unwrap_err();
    assert_eq!(err.tick, 1);
    assert_eq!(
        err.phase,
        TickPhase::StagingOut {
            rule: Some(RuleKind::VelocityMatching)
        }
    );
    assert_eq!(engine.state(), &committed);
    assert_eq!(engine.stats().failed, 1);

    engine.tick()?;
    assert_eq!(engine.ticks_completed(), 2);
    assert_eq!(engine.stats().completed, 2);
    Ok(())
}

#[test]
fn a_source_without_rule_4_fails_setup_and_releases_everything() -> Result<()> {
    let config = host_config(8, 1);
    let backend = flocking_backend(&config);
    let source = flocking_program_source(&config.flocking, &config.field)
        .replace("@compute @workgroup_size(64)\nfn rule_4", "fn rule_4");

    let err = SimulationEngine::builder(config)
        .with_source(source)
        .build(&backend)
        .unwrap_err();
    assert_eq!(
        err,
        SetupError::Compute(ComputeError::EntryPointNotFound("rule_4".into()))
    );
    assert!(!backend.is_claimed(0, 0));
    assert_eq!(backend.resource_counts(0, 0).map(|c| c.is_empty()), Some(true));
    Ok(())
}

#[test]
fn dropping_the_engine_releases_the_device() -> Result<()> {
    let config = host_config(8, 1);
    let backend = flocking_backend(&config);
    let engine = SimulationEngine::new(config.clone(), &backend)?;
    assert!(backend.is_claimed(0, 0));
    let live = backend.resource_counts(0, 0).unwrap_or_default();
    assert!(!live.is_empty());

    let second = SimulationEngine::new(config.clone(), &backend).unwrap_err();
    assert!(matches!(
        second,
        SetupError::Compute(ComputeError::DeviceUnavailable { .. })
    ));

    let final_state = engine.shutdown();
    assert_eq!(final_state.ticks(), 0);
    assert!(!backend.is_claimed(0, 0));
    assert_eq!(backend.resource_counts(0, 0).map(|c| c.is_empty()), Some(true));

    // The device can be claimed again.
    let _engine = SimulationEngine::new(config, &backend)?;
    Ok(())
}

#[test]
fn teardown_releases_in_reverse_creation_order() -> Result<()> {
    let config = host_config(8, 1);
    let backend = flocking_backend(&config);
    let mut engine = SimulationEngine::new(config, &backend)?;
    engine.tick()?;
    assert_eq!(backend.release_log(0, 0), Some(Vec::new()));
    drop(engine);

    let mut expected = vec!["buffer next_swarm".to_owned()];
    expected.extend(
        RuleKind::ALL
            .iter()
            .rev()
            .map(|rule| format!("buffer {}", rule.output_label())),
    );
    expected.push("buffer predators".into());
    expected.push("buffer swarm".into());
    expected.push("kernel single_step".into());
    expected.extend(
        RuleKind::ALL
            .iter()
            .rev()
            .map(|rule| format!("kernel {}", rule.entry_point())),
    );
    expected.push("program flocking".into());

    assert_eq!(backend.release_log(0, 0), Some(expected));
    Ok(())
}

#[test]
fn mismatched_initial_state_is_rejected_before_any_device_work() {
    let config = host_config(4, 1);
    let backend = flocking_backend(&config);
    let err = SimulationEngine::builder(config)
        .with_initial_state(Swarm::zeroed(3), vec![Agent::default()])
        .build(&backend)
        .unwrap_err();
    assert!(matches!(err, SetupError::InvalidConfig(_)));
    assert!(!backend.is_claimed(0, 0));
}

#[test]
fn empty_swarms_are_invalid() {
    let config = host_config(0, 1);
    let backend = flocking_backend(&config);
    let err = SimulationEngine::new(config, &backend).unwrap_err();
    assert!(matches!(err, SetupError::InvalidConfig(_)));
}

#[test]
fn engine_reports_its_device() -> Result<()> {
    let config = host_config(4, 0);
    let backend = flocking_backend(&config);
    let engine = SimulationEngine::new(config, &backend)?;
    assert_eq!(engine.device().name, "Host CPU");
    assert_eq!(engine.device().platform, "Host Reference");
    assert!(engine.program().has_entry_point("single_step"));
    assert_eq!(backend.name(), "host");
    Ok(())
}
