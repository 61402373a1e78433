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


//! Runtime settings, read from a JSON document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tessera_sdk::prelude::EngineConfig;

/// Environment variable naming the config file when no argument is given.
pub const CONFIG_ENV: &str = "TESSERA_CONFIG";

/// Everything a run needs: the engine settings shared by every rank plus the
/// scene and output settings of this binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// In-process ranks.
    pub ranks: usize,
    /// Frames to render before stopping.
    pub frames: u64,
    /// Spheres generated inside each rank's brick.
    pub spheres_per_rank: usize,
    /// Radius of every sphere.
    pub sphere_radius: f32,
    /// Base seed of the sphere generator.
    pub seed: u64,
    /// Where the controlling rank writes its PNG frames.
    pub output_dir: PathBuf,
    /// Level used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Engine settings.
    pub engine: EngineConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            ranks: 4,
            frames: 8,
            spheres_per_rank: 10,
            sphere_radius: 0.1,
            seed: 0x7E55_E7A,
            output_dir: PathBuf::from("frames"),
            log_level: "info".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Parses a JSON document; absent fields keep their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing runtime config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("loading {}", path.display()))
    }

    /// Resolves the config from `arg`, then [`CONFIG_ENV`], then the defaults.
    pub fn resolve(arg: Option<String>) -> Result<Self> {
        match arg.or_else(|| std::env::var(CONFIG_ENV).ok()) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Checks the settings against each other.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.ranks > 0, "a run needs at least one rank");
        anyhow::ensure!(
            self.sphere_radius > 0.0,
            "sphere_radius must be positive, got {}",
            self.sphere_radius
        );
        self.engine
            .validate_for(self.ranks)
            .context("invalid engine settings")?;
        Ok(())
    }
}
