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


//! The distributed frame loop.
//!
//! Every rank runs one [`Coordinator`] and calls
//! [`render_frame`](Coordinator::render_frame) in lockstep. A frame goes
//! through these steps:
//!
//! 1. the controlling rank runs its UI callback, which stages parameters;
//! 2. the staged parameters are broadcast and applied on every rank;
//! 3. objects whose parameters changed are re-committed;
//! 4. each rank renders its local data into its own frame buffer;
//! 5. partial frames are gathered and depth-composited on the controlling
//!    rank, which presents the result and runs the display callback.
//!
//! Any error on a rank of a multi-rank group, other than a cancelled frame,
//! aborts the whole group: peers would otherwise block in the next collective.

use crate::commit_queue::CommitQueue;
use crate::error::FrameError;
use crate::sync::ParameterSync;
use crate::topology::RankTopology;
use std::sync::Arc;
use std::time::Instant;
use tessera_core::collective::Collective;
use tessera_core::config::EngineConfig;
use tessera_core::context::RenderContext;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::object::ObjectRef;
use tessera_core::param::ParamValue;
use tessera_core::platform::Presenter;
use tessera_lanes::{
    CancelToken, Compositor, DepthCompositor, PartialFrame, RenderError, RenderStats, Renderer,
    TileScheduler,
};
use tessera_telemetry::{FrameStats, FrameTelemetry};

/// Runs on the controlling rank before the broadcast.
pub type UiCallback = Box<dyn FnMut(u64, &mut ParameterSync) + Send>;

/// Runs on the controlling rank after compositing.
pub type DisplayCallback = Box<dyn FnMut(&FrameBuffer, &FrameStats) + Send>;

const STATUS_COMPLETE: u8 = 0;
const STATUS_CANCELLED: u8 = 1;

/// What a call to [`Coordinator::render_frame`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameStatus {
    /// The frame was rendered (and composited on the controlling rank).
    Rendered(FrameStats),
    /// The controlling rank asked every rank to stop; nothing was rendered.
    Stopped,
}

/// Drives one rank through the distributed frame loop.
pub struct Coordinator {
    context: RenderContext,
    collective: Arc<dyn Collective>,
    topology: RankTopology,
    renderer: Renderer,
    controlling_rank: usize,
    tile_size: u32,
    scheduler: TileScheduler,
    compositor: Box<dyn Compositor>,
    sync: ParameterSync,
    commits: CommitQueue,
    local: FrameBuffer,
    composite: Option<FrameBuffer>,
    presenter: Option<Box<dyn Presenter>>,
    ui: Option<UiCallback>,
    display: Option<DisplayCallback>,
    cancel: CancelToken,
    telemetry: FrameTelemetry,
    frame: u64,
    max_frames: Option<u64>,
}

impl Coordinator {
    /// Sets up this rank's frame loop for `renderer`.
    ///
    /// The renderer, and the world and camera bound to it, are committed by
    /// the caller before the first frame.
    pub fn new(
        context: RenderContext,
        collective: Arc<dyn Collective>,
        renderer: Renderer,
        config: &EngineConfig,
    ) -> Result<Self, FrameError> {
        let world_size = collective.world_size();
        config.validate_for(world_size)?;
        let topology = RankTopology::new(collective.rank(), world_size)?;
        let controlling_rank = config.controlling_rank;
        let frame_size = config.frame_size();
        let composite =
            (topology.rank() == controlling_rank).then(|| FrameBuffer::new(frame_size));

        log::info!(
            "Coordinator: rank {}/{} brick {} of grid {}, {} tile workers",
            topology.rank(),
            world_size,
            topology.coord(),
            topology.grid(),
            config.resolved_workers()
        );

        Ok(Self {
            context,
            collective,
            topology,
            renderer,
            controlling_rank,
            tile_size: config.tile_size,
            scheduler: TileScheduler::new(config.resolved_workers()),
            compositor: Box::new(DepthCompositor),
            sync: ParameterSync::new(),
            commits: CommitQueue::new(),
            local: FrameBuffer::new(frame_size),
            composite,
            presenter: None,
            ui: None,
            display: None,
            cancel: CancelToken::new(),
            telemetry: FrameTelemetry::default(),
            frame: 0,
            max_frames: None,
        })
    }

    /// Replaces the depth compositor.
    pub fn with_compositor(mut self, compositor: Box<dyn Compositor>) -> Self {
        self.compositor = compositor;
        self
    }

    /// Presents composited frames; only used on the controlling rank.
    pub fn with_presenter(mut self, presenter: Box<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Stops the group after `frames` frames.
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Replaces the telemetry window.
    pub fn with_telemetry(mut self, telemetry: FrameTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Registers the UI callback. It only runs on the controlling rank.
    pub fn on_ui<F>(&mut self, callback: F)
    where
        F: FnMut(u64, &mut ParameterSync) + Send + 'static,
    {
        if !self.is_controlling() {
            log::debug!(
                "Coordinator: rank {} is not controlling, its UI callback never runs",
                self.rank()
            );
        }
        self.ui = Some(Box::new(callback));
    }

    /// Registers the display callback. It only runs on the controlling rank.
    pub fn on_display<F>(&mut self, callback: F)
    where
        F: FnMut(&FrameBuffer, &FrameStats) + Send + 'static,
    {
        self.display = Some(Box::new(callback));
    }

    /// This rank.
    pub fn rank(&self) -> usize {
        self.topology.rank()
    }

    /// The rank topology.
    pub fn topology(&self) -> &RankTopology {
        &self.topology
    }

    /// `true` on the rank running the UI and receiving the composite.
    pub fn is_controlling(&self) -> bool {
        self.rank() == self.controlling_rank
    }

    /// The renderer this rank draws with.
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The index of the next frame.
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// The synchronized parameters.
    pub fn sync(&self) -> &ParameterSync {
        &self.sync
    }

    /// Mutable access to the synchronized parameters, e.g. to declare and
    /// bind keys before the first frame.
    pub fn sync_mut(&mut self) -> &mut ParameterSync {
        &mut self.sync
    }

    /// Queues `object` for commit before the next render.
    pub fn add_object_to_commit(&mut self, object: ObjectRef) {
        self.commits.push(object);
    }

    /// A token abandoning in-flight tiles when cancelled.
    ///
    /// On the controlling rank, a cancelled token also stops the group at the
    /// next frame. Elsewhere it abandons only the current frame: the token is
    /// cleared once the cancelled frame has been gathered.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Statistics of the recent frames.
    pub fn telemetry(&self) -> &FrameTelemetry {
        &self.telemetry
    }

    /// This rank's last complete partial frame.
    pub fn local_frame(&self) -> &FrameBuffer {
        &self.local
    }

    /// The last composited frame; `None` except on the controlling rank.
    pub fn composite(&self) -> Option<&FrameBuffer> {
        self.composite.as_ref()
    }

    /// Runs frames until the controlling rank stops the group.
    ///
    /// Cancelled frames are logged and skipped. Returns the number of frames
    /// rendered.
    pub fn run(&mut self) -> Result<u64, FrameError> {
        let mut rendered = 0;
        loop {
            match self.render_frame() {
                Ok(FrameStatus::Rendered(_)) => rendered += 1,
                Ok(FrameStatus::Stopped) => break,
                Err(FrameError::Cancelled { frame, ranks }) => {
                    log::warn!("Coordinator: frame {} cancelled on ranks {:?}", frame, ranks);
                }
                Err(err) => return Err(err),
            }
        }
        log::info!(
            "Coordinator: rank {} stopped after {} frames",
            self.rank(),
            rendered
        );
        Ok(rendered)
    }

    /// Renders one frame in lockstep with the rest of the group.
    pub fn render_frame(&mut self) -> Result<FrameStatus, FrameError> {
        let result = self.step();
        if let Err(err) = &result {
            let cancelled = matches!(err, FrameError::Cancelled { .. });
            if err.is_fatal() || (self.topology.world_size() > 1 && !cancelled) {
                log::error!(
                    "Coordinator: rank {} aborting the group: {}",
                    self.rank(),
                    err
                );
                self.collective.abort(&err.to_string());
            }
        }
        result
    }

    fn step(&mut self) -> Result<FrameStatus, FrameError> {
        let started = Instant::now();
        let frame = self.frame;

        if self.is_controlling() {
            if let Some(ui) = self.ui.as_mut() {
                ui(frame, &mut self.sync);
            }
            let finished = self.max_frames.is_some_and(|max| frame >= max);
            let closed = self.presenter.as_ref().is_some_and(|p| p.should_close());
            if finished || closed || self.cancel.is_cancelled() {
                self.sync.request_stop();
            }
        }

        let changed = self
            .sync
            .synchronize(self.collective.as_ref(), self.controlling_rank, frame)?;
        let sync = started.elapsed();
        self.frame += 1;
        if !self.sync.is_running() {
            log::debug!("Coordinator: rank {} received stop at frame {}", self.rank(), frame);
            return Ok(FrameStatus::Stopped);
        }

        for object in changed {
            self.commits.push(object);
        }
        let recommitted = self.commits.flush(&self.context)?;

        let render_started = Instant::now();
        let (status, render_stats) = self.render_local()?;
        let render = render_started.elapsed();

        let composite_started = Instant::now();
        let cancelled = self.gather_and_composite(status)?;
        let composite = composite_started.elapsed();
        if status == STATUS_CANCELLED && !self.is_controlling() {
            self.cancel.reset();
        }

        let stats = FrameStats {
            frame,
            rank: self.rank(),
            spp: self.current_spp(),
            recommitted,
            tiles: render_stats.tiles,
            workers: render_stats.workers,
            sync,
            render,
            composite,
            total: started.elapsed(),
        };

        if !cancelled.is_empty() {
            return Err(FrameError::Cancelled {
                frame,
                ranks: cancelled,
            });
        }

        if let Some(target) = self.composite.as_ref() {
            if let Some(presenter) = self.presenter.as_mut() {
                presenter.present(target)?;
            }
            if let Some(display) = self.display.as_mut() {
                display(target, &stats);
            }
        }
        self.telemetry.record(stats);
        Ok(FrameStatus::Rendered(stats))
    }

    fn render_local(&mut self) -> Result<(u8, RenderStats), FrameError> {
        let job = self
            .renderer
            .create_render_job(&self.local, self.tile_size)?;
        let kernel = self.context.kernel_arc();
        match job.render(&self.scheduler, kernel.as_ref(), &mut self.local, &self.cancel) {
            Ok(stats) => Ok((STATUS_COMPLETE, stats)),
            Err(RenderError::Cancelled { completed, total }) => {
                log::debug!(
                    "Coordinator: rank {} abandoned frame {} after {}/{} tiles",
                    self.rank(),
                    self.frame - 1,
                    completed,
                    total
                );
                Ok((STATUS_CANCELLED, RenderStats::default()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Sends this rank's partial frame to the controlling rank and, there,
    /// composites every partial. Returns the ranks that cancelled.
    fn gather_and_composite(&mut self, status: u8) -> Result<Vec<usize>, FrameError> {
        let mut payload = Vec::with_capacity(1 + self.local.size().area() * 20);
        payload.push(status);
        payload.extend_from_slice(&self.local.to_bytes());

        let Some(gathered) = self.collective.gather(&payload, self.controlling_rank)? else {
            return Ok(if status == STATUS_CANCELLED {
                vec![self.rank()]
            } else {
                Vec::new()
            });
        };

        let size = self.local.size();
        let mut cancelled = Vec::new();
        let mut partials = Vec::with_capacity(gathered.len());
        for (rank, bytes) in gathered.iter().enumerate() {
            let malformed = || FrameError::MalformedPartialFrame {
                rank,
                len: bytes.len(),
            };
            let (&status, pixels) = bytes.split_first().ok_or_else(malformed)?;
            if status == STATUS_CANCELLED {
                cancelled.push(rank);
                continue;
            }
            let frame = FrameBuffer::from_bytes(size, pixels).ok_or_else(malformed)?;
            partials.push(PartialFrame { rank, frame });
        }

        if cancelled.is_empty() {
            if let Some(target) = self.composite.as_mut() {
                self.compositor.composite(&partials, target)?;
            }
        }
        Ok(cancelled)
    }

    fn current_spp(&self) -> i32 {
        match self.renderer.object().param("spp") {
            Some(ParamValue::Int(spp)) => spp,
            _ => 1,
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("rank", &self.rank())
            .field("world_size", &self.topology.world_size())
            .field("controlling_rank", &self.controlling_rank)
            .field("frame", &self.frame)
            .finish_non_exhaustive()
    }
}
