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

//! Command-line interface of the runtime.

use clap::Parser;
use murmur_core::{BackendKind, SimulationConfig};
use murmur_sdk::load_config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "murmur", version, about = "Runs a swarm simulation on a compute device")]
pub struct Cli {
    /// JSON configuration file. Flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Compute backend (`wgpu` or `host`).
    #[arg(long)]
    pub backend: Option<BackendKind>,

    /// Platform index, as listed by `--list-devices`.
    #[arg(long)]
    pub platform: Option<usize>,

    /// Device index within the platform.
    #[arg(long)]
    pub device: Option<usize>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    pub ticks: u64,

    /// Seed of the initial swarm.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run this WGSL file instead of the built-in flocking program.
    #[arg(long)]
    pub kernel_source: Option<PathBuf>,

    /// List the platforms and devices of the backend, then exit.
    #[arg(long)]
    pub list_devices: bool,

    /// How many times a failed tick is retried before giving up.
    #[arg(long, default_value_t = 1)]
    pub max_retries: u32,

    /// Log tick statistics every this many ticks (0 disables).
    #[arg(long, default_value_t = 100)]
    pub report_every: u64,
}

impl Cli {
    /// The configuration file, or the defaults, with the flags applied.
    pub fn resolve_config(&self) -> anyhow::Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimulationConfig::default(),
        };
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(platform) = self.platform {
            config.device.platform = platform;
        }
        if let Some(device) = self.device {
            config.device.device = device;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_the_defaults() {
        let cli = Cli::parse_from([
            "murmur",
            "--backend",
            "host",
            "--device",
            "2",
            "--seed",
            "9",
            "--ticks",
            "50",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.backend, BackendKind::Host);
        assert_eq!(config.device.device, 2);
        assert_eq!(config.device.platform, 0);
        assert_eq!(config.seed, Some(9));
        assert_eq!(cli.ticks, 50);
        assert_eq!(cli.max_retries, 1);
    }

    #[test]
    fn unknown_backends_are_rejected() {
        assert!(Cli::try_parse_from(["murmur", "--backend", "opencl"]).is_err());
    }
}
