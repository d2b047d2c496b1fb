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

//! Reading configurations and kernel sources from disk.

use anyhow::{Context, Result};
use murmur_core::SimulationConfig;
use std::fs;
use std::path::Path;

/// Reads and validates a JSON configuration.
pub fn load_config(path: &Path) -> Result<SimulationConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration '{}'", path.display()))?;
    let config = SimulationConfig::from_json(&text)
        .with_context(|| format!("Failed to parse configuration '{}'", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Configuration '{}' is not usable", path.display()))?;
    log::debug!("Loaded configuration from '{}'", path.display());
    Ok(config)
}

/// Reads an external program source.
pub fn load_kernel_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read kernel source '{}'", path.display()))?;
    log::info!(
        "Loaded kernel source '{}' ({} bytes)",
        path.display(),
        source.len()
    );
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::BackendKind;
    use std::path::PathBuf;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("murmur-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_a_partial_config() {
        let path = scratch_file("partial.json", r#"{ "swarm_size": 32, "backend": "host" }"#);
        let config = load_config(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.swarm_size, 32);
        assert_eq!(config.backend, BackendKind::Host);
    }

    #[test]
    fn invalid_configs_name_the_file() {
        let path = scratch_file("empty-swarm.json", r#"{ "swarm_size": 0 }"#);
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        let message = format!("{err:#}");
        assert!(message.contains("empty-swarm.json"), "{message}");
        assert!(message.contains("swarm_size must be at least 1"), "{message}");
    }

    #[test]
    fn missing_sources_are_reported() {
        let err = load_kernel_source(Path::new("/nonexistent/murmur.wgsl")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/murmur.wgsl"));
    }
}
