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


//! Per-frame render jobs.

use crate::error::RenderError;
use crate::scheduler::{CancelToken, RenderStats, TileScheduler};
use std::sync::Arc;
use tessera_core::error::KernelError;
use tessera_core::framebuffer::{tile_grid, FrameBuffer, Tile, TileRect};
use tessera_core::kernel::ComputeKernel;
use tessera_core::math::{Aabb, Extent2D};
use tessera_core::object::CompiledForm;

/// One frame's worth of work against fixed compiled state.
///
/// The job holds snapshots of the renderer, camera and world compiled forms
/// taken when it was created. Re-committing any of them afterwards does not
/// affect the job; create a new job to pick the change up.
#[derive(Debug, Clone)]
pub struct RenderJob {
    renderer: Arc<CompiledForm>,
    camera: Arc<CompiledForm>,
    world: Arc<CompiledForm>,
    frame_size: Extent2D,
    tiles: Vec<TileRect>,
}

impl RenderJob {
    pub(crate) fn new(
        renderer: Arc<CompiledForm>,
        camera: Arc<CompiledForm>,
        world: Arc<CompiledForm>,
        frame_size: Extent2D,
        tile_size: u32,
    ) -> Self {
        Self {
            renderer,
            camera,
            world,
            frame_size,
            tiles: tile_grid(frame_size, tile_size),
        }
    }

    /// The frame size the job renders.
    pub fn frame_size(&self) -> Extent2D {
        self.frame_size
    }

    /// The tiles of the frame.
    pub fn tiles(&self) -> &[TileRect] {
        &self.tiles
    }

    /// Bounds of the world snapshot.
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.world.bounds()
    }

    /// Renders one tile.
    ///
    /// Only reads the job's snapshots, so distinct tiles may be rendered
    /// concurrently.
    pub fn render_tile(&self, kernel: &dyn ComputeKernel, rect: TileRect) -> Result<Tile, KernelError> {
        let mut tile = Tile::new(rect, self.frame_size);
        kernel.render_tile(
            &mut tile,
            self.renderer.handle(),
            self.camera.handle(),
            self.world.handle(),
        )?;
        tile.validate()?;
        Ok(tile)
    }

    /// Renders every tile on `scheduler` and writes them into `frame_buffer`.
    ///
    /// The frame buffer is only written once all tiles completed; on error or
    /// cancellation it is left exactly as it was.
    pub fn render(
        &self,
        scheduler: &TileScheduler,
        kernel: &dyn ComputeKernel,
        frame_buffer: &mut FrameBuffer,
        cancel: &CancelToken,
    ) -> Result<RenderStats, RenderError> {
        if frame_buffer.size() != self.frame_size {
            return Err(RenderError::FrameSizeMismatch {
                expected: self.frame_size,
                found: frame_buffer.size(),
            });
        }
        let (tiles, stats) =
            scheduler.run(&self.tiles, cancel, |rect| self.render_tile(kernel, rect))?;
        for tile in &tiles {
            frame_buffer.write_tile(tile);
        }
        Ok(stats)
    }
}
