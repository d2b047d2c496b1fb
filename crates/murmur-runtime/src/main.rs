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

//! `murmur`: runs a swarm simulation headless and reports its tick timings.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::Cli;
use murmur_sdk::prelude::*;

/// Runs one tick, retrying it up to `max_retries` times.
///
/// A failed tick commits nothing, so retrying it replays the same tick.
fn tick_with_retries(engine: &mut SimulationEngine, max_retries: u32) -> Result<(), TickError> {
    let mut attempt = 0;
    loop {
        match engine.tick() {
            Ok(()) => return Ok(()),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                log::warn!("{err}; retrying ({attempt}/{max_retries})");
            }
            Err(err) => return Err(err),
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.resolve_config()?;
    let backend = backend_for(&config)?;

    if cli.list_devices {
        print!("{}", describe_devices(backend.as_ref()));
        return Ok(());
    }

    let mut builder = SimulationEngine::builder(config);
    if let Some(path) = &cli.kernel_source {
        builder = builder.with_source(load_kernel_source(path)?);
    }
    let mut engine = builder
        .build(backend.as_ref())
        .context("Simulation setup failed")?;

    for _ in 0..cli.ticks {
        if let Err(err) = tick_with_retries(&mut engine, cli.max_retries) {
            bail!(
                "Giving up after {} committed ticks: {err}",
                engine.ticks_completed()
            );
        }
        let done = engine.ticks_completed();
        if cli.report_every > 0 && done % cli.report_every == 0 {
            log::info!("{}", engine.stats());
        }
    }

    log::info!("Finished: {}", engine.stats());
    if let Some(predator) = engine.current_predator() {
        log::info!(
            "Predator at ({:.2}, {:.2})",
            predator.position.x,
            predator.position.y
        );
    }
    Ok(())
}

fn main() {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}
