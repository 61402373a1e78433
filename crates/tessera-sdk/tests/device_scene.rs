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


//! Building and rendering a scene through the device.

use approx::assert_relative_eq;
use std::sync::Arc;
use tessera_sdk::prelude::*;

fn sphere_scene(device: &Device, config: &EngineConfig) -> anyhow::Result<Renderer> {
    let renderer = device.new_renderer("scivis")?;

    let material = device.new_material(&renderer, "obj")?;
    material.set("Kd", Vec3::new(0.9, 0.3, 0.1));
    device.commit(&material)?;

    let spheres = device.new_geometry("spheres")?;
    spheres.set("spheres", DataBuffer::from_slice(&[Vec3::ZERO]));
    spheres.set("radius", 0.75_f32);
    spheres.set("material", material);
    device.commit(&spheres)?;

    let world = device.new_world()?;
    world.set("geometry", spheres);
    device.commit(&world)?;

    let camera = device.new_camera("perspective")?;
    camera.set("position", Vec3::new(0.0, 0.0, 3.0));
    camera.set("aspect", config.frame_size().aspect());
    device.commit(&camera)?;

    let light = device.new_light(&renderer, "ambient")?;
    device.commit(&light)?;

    let object = renderer.object();
    object.set("lights", vec![light]);
    object.set("world", world);
    object.set("camera", camera);
    device.commit(object)?;
    Ok(renderer)
}

#[test]
fn test_single_rank_frames_reach_the_presenter() {
    let config = EngineConfig {
        frame_width: 24,
        frame_height: 24,
        tile_size: 8,
        worker_threads: 2,
        ..EngineConfig::default()
    };
    let device = Device::new();
    let renderer = sphere_scene(&device, &config).unwrap();

    let mut coordinator = Coordinator::new(
        device.context().clone(),
        Arc::new(SingleRank::new()),
        renderer,
        &config,
    )
    .unwrap()
    .with_max_frames(2);

    assert_eq!(coordinator.run().unwrap(), 2);
    let composite = coordinator.composite().unwrap();
    assert_relative_eq!(composite.depth_at(12, 12).unwrap(), 2.25, epsilon = 0.05);
    assert_eq!(composite.depth_at(0, 0), Some(f32::INFINITY));
    assert_eq!(coordinator.telemetry().frames(), 2);
}

#[test]
fn test_missing_spheres_data_fails_commit() {
    let device = Device::new();
    let spheres = device.new_geometry("spheres").unwrap();
    assert!(device.commit(&spheres).is_err());
    assert!(!spheres.is_committed());
}
