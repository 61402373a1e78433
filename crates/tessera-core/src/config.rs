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


//! Engine configuration.
//!
//! Every field has a default, so a JSON document only needs to name what it
//! overrides:
//!
//! ```json
//! { "frame_width": 640, "frame_height": 480, "tile_size": 32 }
//! ```

use crate::error::ConfigError;
use crate::framebuffer::DEFAULT_TILE_SIZE;
use crate::math::{Aabb, Extent2D, Vec3};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The global domain the ranks decompose, as two corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Lower corner.
    pub lower: [f32; 3],
    /// Upper corner.
    pub upper: [f32; 3],
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            lower: [-1.0; 3],
            upper: [1.0; 3],
        }
    }
}

impl DomainConfig {
    /// The domain as a box.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_min_max(Vec3::from(self.lower), Vec3::from(self.upper))
    }
}

/// Settings shared by every rank of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Frame buffer width in pixels.
    pub frame_width: u32,
    /// Frame buffer height in pixels.
    pub frame_height: u32,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Tile workers per rank; `0` uses the available parallelism.
    pub worker_threads: usize,
    /// The rank whose UI drives synchronized parameters and which composites.
    pub controlling_rank: usize,
    /// How long a rank waits in a collective before giving up.
    pub collective_timeout_ms: u64,
    /// The global domain.
    pub domain: DomainConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_width: 1024,
            frame_height: 768,
            tile_size: DEFAULT_TILE_SIZE,
            worker_threads: 0,
            controlling_rank: 0,
            collective_timeout_ms: 30_000,
            domain: DomainConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Checks ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tile_size == 0 {
            return Err(ConfigError::Invalid("tile_size must be positive".into()));
        }
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size {}x{} is empty",
                self.frame_width, self.frame_height
            )));
        }
        if !self.domain.bounds().is_valid() || self.domain.lower == self.domain.upper {
            return Err(ConfigError::Invalid("domain is empty".into()));
        }
        Ok(())
    }

    /// Fails if `controlling_rank` is outside a group of `world_size`.
    pub fn validate_for(&self, world_size: usize) -> Result<(), ConfigError> {
        self.validate()?;
        if self.controlling_rank >= world_size {
            return Err(ConfigError::Invalid(format!(
                "controlling rank {} is outside a group of {}",
                self.controlling_rank, world_size
            )));
        }
        Ok(())
    }

    /// The frame buffer size.
    pub fn frame_size(&self) -> Extent2D {
        Extent2D::new(self.frame_width, self.frame_height)
    }

    /// Worker count with `0` resolved to the available parallelism.
    pub fn resolved_workers(&self) -> usize {
        if self.worker_threads > 0 {
            self.worker_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}
