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


//! The distributed spheres scene each rank builds before its first frame.

use crate::config::RuntimeConfig;
use anyhow::{Context, Result};
use tessera_sdk::prelude::*;

/// Renderer type every rank uses.
pub const RENDERER: &str = "mpi_raycast";

/// Samples per pixel the UI cycles through, one step per frame.
pub const SPP_CYCLE: [i32; 7] = [1, 2, 4, 8, 16, 32, 64];

/// What one rank built.
pub struct RankScene {
    /// The committed renderer with world, camera and lights bound.
    pub renderer: Renderer,
    /// This rank's place in the grid.
    pub topology: RankTopology,
    /// Spheres generated inside this rank's brick.
    pub spheres: usize,
}

/// Builds and commits this rank's spheres, world, lights, camera and renderer.
pub fn build(device: &Device, topology: RankTopology, config: &RuntimeConfig) -> Result<RankScene> {
    let renderer = device.new_renderer(RENDERER)?;
    let domain = config.engine.domain.bounds();
    let decomposition = DomainDecomposition::for_topology(domain, &topology);
    let settings = SphereSettings {
        count: config.spheres_per_rank,
        radius: config.sphere_radius,
        seed: config.seed,
    };
    let local = make_local_spheres(
        device.context(),
        &renderer,
        &topology,
        &decomposition,
        &settings,
    )
    .with_context(|| format!("generating spheres on rank {}", topology.rank()))?;

    let world = device.new_world()?;
    world.set("geometry", local.geometry.clone());
    world.set("id", topology.rank() as i32);
    device.commit(&world)?;

    let ambient = device.new_light(&renderer, "ambient")?;
    ambient.set("intensity", 0.25_f32);
    device.commit(&ambient)?;
    let sun = device.new_light(&renderer, "distant")?;
    sun.set("direction", Vec3::new(-1.0, -1.0, 0.5));
    device.commit(&sun)?;

    let camera = device.new_camera("perspective")?;
    let center = domain.center();
    let size = domain.size();
    camera.set("position", center + Vec3::new(0.0, 0.0, size.z * 2.0));
    camera.set("direction", Vec3::NEG_Z);
    camera.set("aspect", config.engine.frame_size().aspect());
    device.commit(&camera)?;

    let object = renderer.object();
    object.set("world", world);
    object.set("camera", camera);
    object.set("lights", vec![ambient, sun]);
    object.set("spp", SPP_CYCLE[0]);
    device.commit(object)?;

    log::debug!(
        "Scene: rank {} built {} spheres in brick {}",
        topology.rank(),
        local.spheres.len(),
        topology.coord()
    );
    Ok(RankScene {
        renderer,
        topology,
        spheres: local.spheres.len(),
    })
}

/// The sample count staged for `frame`.
pub fn spp_for_frame(frame: u64) -> i32 {
    SPP_CYCLE[(frame % SPP_CYCLE.len() as u64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spp_cycle_wraps() {
        assert_eq!(spp_for_frame(0), 1);
        assert_eq!(spp_for_frame(6), 64);
        assert_eq!(spp_for_frame(7), 1);
    }

    #[test]
    fn test_every_rank_builds_a_committed_scene() {
        let config = RuntimeConfig {
            spheres_per_rank: 5,
            ..RuntimeConfig::default()
        };
        for rank in 0..4 {
            let device = Device::new();
            let topology = RankTopology::new(rank, 4).unwrap();
            let scene = build(&device, topology, &config).unwrap();
            assert_eq!(scene.spheres, 5);
            assert!(scene.renderer.object().is_committed());
            assert!(scene.renderer.object().object_param("world").is_some());
        }
    }
}
