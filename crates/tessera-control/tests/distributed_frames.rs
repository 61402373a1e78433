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


//! Distributed frame loop over in-process rank groups.

use std::sync::Arc;
use std::time::Duration;
use tessera_control::{
    make_local_spheres, Coordinator, DomainDecomposition, FrameError, FrameStatus, RankTopology,
    SphereSettings, SyncedValue,
};
use tessera_core::collective::Collective;
use tessera_core::config::EngineConfig;
use tessera_core::context::RenderContext;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::math::{LinearRgba, Vec3};
use tessera_core::object::ObjectCategory;
use tessera_core::registry::TypeRegistry;
use tessera_infra::{CpuKernel, HeadlessPresenter, LocalCollective, LocalGroup, SingleRank};
use tessera_lanes::{Compositor, DepthCompositor, PartialFrame, RenderError, Renderer};

fn small_config() -> EngineConfig {
    EngineConfig {
        frame_width: 32,
        frame_height: 24,
        tile_size: 16,
        worker_threads: 2,
        collective_timeout_ms: 10_000,
        ..EngineConfig::default()
    }
}

fn context() -> RenderContext {
    let registry = Arc::new(TypeRegistry::new());
    tessera_plugins::install(&registry);
    RenderContext::new(registry, Arc::new(CpuKernel::new()))
}

/// Builds one rank's spheres, world, camera and renderer, all committed.
fn build_rank(collective: Arc<dyn Collective>, config: &EngineConfig) -> Coordinator {
    let context = context();
    let topology = RankTopology::new(collective.rank(), collective.world_size()).unwrap();
    let renderer = Renderer::create(&context, "mpi_raycast").unwrap();

    let decomposition = DomainDecomposition::for_topology(config.domain.bounds(), &topology);
    let settings = SphereSettings {
        count: 20,
        radius: 0.2,
        seed: 7,
    };
    let local = make_local_spheres(&context, &renderer, &topology, &decomposition, &settings).unwrap();

    let world = context.create(ObjectCategory::World, "world").unwrap();
    world.set("geometry", vec![local.geometry.clone()]);
    world.set("id", topology.rank() as i32);
    world.commit(&context).unwrap();

    let camera = context.create(ObjectCategory::Camera, "perspective").unwrap();
    camera.set("position", Vec3::new(0.0, 0.0, 4.0));
    camera.set("direction", Vec3::NEG_Z);
    camera.set("aspect", config.frame_size().aspect());
    camera.commit(&context).unwrap();

    let ambient = renderer.create_light(&context, "ambient").unwrap();
    ambient.commit(&context).unwrap();

    let object = renderer.object();
    object.set("lights", vec![ambient]);
    object.set("world", world);
    object.set("camera", camera);
    object.commit(&context).unwrap();

    Coordinator::new(context, collective, renderer, config).unwrap()
}

fn run_ranks<T, F>(world_size: usize, timeout: Duration, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(LocalCollective) -> T + Sync,
{
    let group = LocalGroup::create(world_size, timeout);
    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = group
            .into_iter()
            .map(|collective| s.spawn(move || f(collective)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

#[test]
fn test_spp_broadcast_recommits_renderer_on_every_rank() {
    let config = small_config();
    let results = run_ranks(4, Duration::from_secs(10), |collective| {
        let mut coordinator = build_rank(Arc::new(collective), &config).with_max_frames(3);
        let renderer = coordinator.renderer().object().clone();
        coordinator.sync_mut().declare("spp", 1);
        coordinator.sync_mut().bind("spp", renderer.clone(), "spp");
        coordinator.on_ui(|frame, sync| {
            if frame == 1 {
                sync.stage("spp", 4);
            }
        });

        let mut stats = Vec::new();
        while let FrameStatus::Rendered(frame) = coordinator.render_frame().unwrap() {
            stats.push(frame);
        }
        (stats, renderer.epoch(), coordinator.sync().applied("spp"))
    });

    assert_eq!(results.len(), 4);
    for (stats, epoch, applied) in results {
        assert_eq!(stats.len(), 3);
        assert_eq!((stats[0].spp, stats[0].recommitted), (1, 0));
        assert_eq!((stats[1].spp, stats[1].recommitted), (4, 1));
        assert_eq!((stats[2].spp, stats[2].recommitted), (4, 0));
        assert_eq!(epoch, 2);
        assert_eq!(applied, Some(SyncedValue::Int(4)));
    }
}

#[test]
fn test_composite_is_the_depth_merge_of_every_rank() {
    let config = small_config();
    let mut results = run_ranks(2, Duration::from_secs(10), |collective| {
        let mut coordinator = build_rank(Arc::new(collective), &config).with_max_frames(1);
        let frames = coordinator.run().unwrap();
        (
            coordinator.rank(),
            frames,
            coordinator.local_frame().clone(),
            coordinator.composite().cloned(),
        )
    });
    results.sort_by_key(|r| r.0);

    assert!(results.iter().all(|r| r.1 == 1));
    assert!(results[1].3.is_none());
    let composite = results[0].3.clone().unwrap();

    let partials: Vec<PartialFrame> = results
        .iter()
        .map(|r| PartialFrame {
            rank: r.0,
            frame: r.2.clone(),
        })
        .collect();
    let mut expected = FrameBuffer::new(config.frame_size());
    DepthCompositor.composite(&partials, &mut expected).unwrap();
    assert_eq!(composite, expected);
    assert!(composite.depth().iter().any(|d| d.is_finite()));
}

#[test]
fn test_presenter_close_stops_every_rank() {
    let config = small_config();
    let results = run_ranks(3, Duration::from_secs(10), |collective| {
        let coordinator = build_rank(Arc::new(collective), &config);
        let mut coordinator = if coordinator.is_controlling() {
            let presenter = HeadlessPresenter::new(config.frame_size()).close_after(2);
            coordinator.with_presenter(Box::new(presenter))
        } else {
            coordinator
        };
        coordinator.run().unwrap()
    });
    assert_eq!(results, vec![2, 2, 2]);
}

#[test]
fn test_missing_peer_is_fatal() {
    let config = small_config();
    let results = run_ranks(2, Duration::from_millis(300), |collective| {
        if collective.rank() == 1 {
            return None;
        }
        let mut coordinator = build_rank(Arc::new(collective), &config);
        Some(coordinator.render_frame().unwrap_err())
    });
    let err = results[0].as_ref().unwrap();
    assert!(err.is_fatal(), "{err}");
}

#[test]
fn test_missing_world_leaves_the_composite_untouched() {
    let config = small_config();
    let context = context();
    let renderer = Renderer::create(&context, "scivis").unwrap();
    renderer.object().commit(&context).unwrap();

    let mut coordinator =
        Coordinator::new(context, Arc::new(SingleRank::new()), renderer, &config).unwrap();
    match coordinator.render_frame() {
        Err(FrameError::Render(RenderError::MissingRequiredBinding { binding, .. })) => {
            assert_eq!(binding, "world")
        }
        other => panic!("unexpected {other:?}"),
    }
    let composite = coordinator.composite().unwrap();
    assert!(composite.color().iter().all(|c| *c == LinearRgba::TRANSPARENT));
    assert!(composite.depth().iter().all(|d| d.is_infinite()));
}

#[test]
fn test_peer_cancel_skips_one_composite_then_recovers() {
    let config = small_config();
    let red = LinearRgba::rgb(1.0, 0.0, 0.0);
    let mut results = run_ranks(2, Duration::from_secs(10), |collective| {
        let mut coordinator = build_rank(Arc::new(collective), &config);
        let renderer = coordinator.renderer().object().clone();
        coordinator.sync_mut().declare("bgColor", Vec3::ZERO);
        coordinator.sync_mut().bind("bgColor", renderer, "bgColor");
        coordinator.on_ui(|frame, sync| {
            if frame == 1 {
                sync.stage("bgColor", Vec3::new(1.0, 0.0, 0.0));
            }
        });

        let first = coordinator.render_frame().unwrap();
        let before = coordinator.composite().cloned();
        if coordinator.rank() == 1 {
            coordinator.cancel_token().cancel();
        }
        let cancelled = coordinator.render_frame().unwrap_err();
        let after_cancel = coordinator.composite().cloned();
        let next = coordinator.render_frame().unwrap();
        (
            coordinator.rank(),
            first,
            before,
            cancelled,
            after_cancel,
            next,
            coordinator.composite().cloned(),
        )
    });
    results.sort_by_key(|r| r.0);

    for (_, first, _, cancelled, _, next, _) in &results {
        assert!(matches!(first, FrameStatus::Rendered(_)));
        match cancelled {
            FrameError::Cancelled { frame, ranks } => {
                assert_eq!(*frame, 1);
                assert_eq!(ranks, &vec![1]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!cancelled.is_fatal());
        assert!(matches!(next, FrameStatus::Rendered(_)));
    }

    let (_, _, before, _, after_cancel, _, last) = &results[0];
    let before = before.as_ref().unwrap();
    assert_eq!(after_cancel.as_ref(), Some(before));
    let last = last.as_ref().unwrap();
    assert_ne!(last, before);
    let background = last.depth().iter().position(|d| d.is_infinite()).unwrap();
    assert_eq!(last.color()[background], red);
}
