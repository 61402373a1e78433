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


// Tessera runtime
// Renders the distributed spheres scene with one thread per rank.

mod config;
mod scene;

use anyhow::{anyhow, Context, Result};
use config::RuntimeConfig;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tessera_sdk::prelude::*;

/// What a rank reports once its frame loop ends.
struct RankReport {
    rank: usize,
    frames: u64,
    summary: TelemetrySummary,
}

fn main() -> Result<()> {
    let config = RuntimeConfig::resolve(std::env::args().nth(1))?;
    init_logging(&config.log_level);
    log::info!(
        "Tessera: {} ranks, {} frames of {}x{}, {} spheres per rank",
        config.ranks,
        config.frames,
        config.engine.frame_width,
        config.engine.frame_height,
        config.spheres_per_rank
    );

    let timeout = Duration::from_millis(config.engine.collective_timeout_ms);
    let collectives = LocalGroup::create(config.ranks, timeout);

    let results: Vec<Result<RankReport>> = thread::scope(|scope| {
        let handles: Vec<_> = collectives
            .into_iter()
            .map(|collective| {
                let config = &config;
                thread::Builder::new()
                    .name(format!("rank-{}", collective.rank()))
                    .spawn_scoped(scope, move || run_rank(Arc::new(collective), config))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(anyhow!("rank thread panicked"))),
                Err(err) => Err(err).context("spawning rank thread"),
            })
            .collect()
    });

    let mut first_error = None;
    for result in results {
        match result {
            Ok(report) => log::info!(
                "Tessera: rank {} rendered {} frames, {}",
                report.rank,
                report.frames,
                serde_json::to_string(&report.summary)?
            ),
            Err(err) => {
                log::error!("Tessera: {err:#}");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => {
            log::info!("Tessera: frames written to {}", config.output_dir.display());
            Ok(())
        }
    }
}

fn run_rank(collective: Arc<dyn Collective>, config: &RuntimeConfig) -> Result<RankReport> {
    let rank = collective.rank();
    let device = Device::new();
    let topology = RankTopology::new(rank, collective.world_size())?;
    let scene = scene::build(&device, topology, config)?;
    let renderer = scene.renderer.clone();

    let mut coordinator = Coordinator::new(
        device.context().clone(),
        collective,
        scene.renderer,
        &config.engine,
    )
    .with_context(|| format!("starting rank {rank}"))?
    .with_max_frames(config.frames);

    coordinator.sync_mut().declare("spp", scene::SPP_CYCLE[0]);
    coordinator
        .sync_mut()
        .bind("spp", renderer.object().clone(), "spp");

    if coordinator.is_controlling() {
        let presenter = ImagePresenter::new(config.output_dir.clone(), config.engine.frame_size())
            .context("opening the output directory")?;
        coordinator = coordinator.with_presenter(Box::new(presenter));
        coordinator.on_ui(|frame, sync| sync.stage("spp", scene::spp_for_frame(frame)));
        coordinator.on_display(|_, stats| {
            log::debug!(
                "Tessera: frame {} at {} spp in {:.2} ms",
                stats.frame,
                stats.spp,
                stats.total.as_secs_f64() * 1000.0
            );
        });
    }

    let frames = coordinator
        .run()
        .with_context(|| format!("rank {rank} failed"))?;
    Ok(RankReport {
        rank,
        frames,
        summary: coordinator.telemetry().summary(),
    })
}
