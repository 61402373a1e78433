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


//! Render jobs against the built-in object types and the CPU kernel.

use std::sync::Arc;
use tessera_core::context::RenderContext;
use tessera_core::error::CommitError;
use tessera_core::framebuffer::FrameBuffer;
use tessera_core::kernel::Sphere;
use tessera_core::math::{Extent2D, LinearRgba, Vec3};
use tessera_core::object::ObjectCategory;
use tessera_core::param::DataBuffer;
use tessera_core::registry::TypeRegistry;
use tessera_infra::CpuKernel;
use tessera_lanes::{CancelToken, RenderError, Renderer, TileScheduler};

const SIZE: Extent2D = Extent2D::new(40, 30);
const TILE: u32 = 16;

fn context() -> RenderContext {
    let registry = Arc::new(TypeRegistry::new());
    tessera_plugins::install(&registry);
    RenderContext::new(registry, Arc::new(CpuKernel::new()))
}

/// A committed renderer looking at one sphere, with world and camera bound.
fn scene(ctx: &RenderContext) -> Renderer {
    let renderer = Renderer::create(ctx, "scivis").unwrap();

    let material = renderer.create_material(ctx, "OBJMaterial").unwrap();
    material.set("Kd", Vec3::new(0.2, 0.4, 0.9));
    material.commit(ctx).unwrap();

    let spheres = ctx.create(ObjectCategory::Geometry, "spheres").unwrap();
    let data = [Sphere {
        center: Vec3::ZERO,
        radius: 0.5,
    }];
    spheres.set("spheres", DataBuffer::from_slice(&data));
    spheres.set("bytes_per_sphere", 16);
    spheres.set("offset_radius", 12);
    spheres.set("material", material);
    spheres.commit(ctx).unwrap();

    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    world.set("geometry", vec![spheres]);
    world.commit(ctx).unwrap();

    let camera = ctx.create(ObjectCategory::Camera, "perspective").unwrap();
    camera.set("position", Vec3::new(0.0, 0.0, 3.0));
    camera.set("aspect", SIZE.aspect());
    camera.commit(ctx).unwrap();

    let ambient = renderer.create_light(ctx, "ambient").unwrap();
    ambient.set("intensity", 0.3_f32);
    ambient.commit(ctx).unwrap();
    let distant = renderer.create_light(ctx, "distant").unwrap();
    distant.set("direction", Vec3::new(-1.0, -1.0, 0.5));
    distant.commit(ctx).unwrap();

    let object = renderer.object();
    object.set("lights", vec![ambient, distant]);
    object.set("world", world);
    object.set("camera", camera);
    object.commit(ctx).unwrap();
    renderer
}

fn render(ctx: &RenderContext, renderer: &Renderer) -> FrameBuffer {
    let mut fb = FrameBuffer::new(SIZE);
    let job = renderer.create_render_job(&fb, TILE).unwrap();
    job.render(&TileScheduler::new(3), ctx.kernel(), &mut fb, &CancelToken::new())
        .unwrap();
    fb
}

#[test]
fn test_missing_world_fails_and_leaves_frame_buffer_untouched() {
    let ctx = context();
    let renderer = Renderer::create(&ctx, "scivis").unwrap();
    let camera = ctx.create(ObjectCategory::Camera, "perspective").unwrap();
    renderer.object().set("camera", camera);
    renderer.object().commit(&ctx).unwrap();

    let mut fb = FrameBuffer::new(SIZE);
    fb.clear(LinearRgba::WHITE);
    let before = fb.clone();

    match renderer.create_render_job(&fb, TILE) {
        Err(RenderError::MissingRequiredBinding { binding, .. }) => assert_eq!(binding, "world"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fb, before);
}

#[test]
fn test_missing_camera_is_named() {
    let ctx = context();
    let renderer = Renderer::create(&ctx, "scivis").unwrap();
    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    renderer.object().set("world", world);

    let err = renderer
        .create_render_job(&FrameBuffer::new(SIZE), TILE)
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::MissingRequiredBinding {
            binding: "camera",
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "renderer 'scivis' has no 'camera' binding"
    );
}

#[test]
fn test_uncommitted_binding_is_a_commit_error() {
    let ctx = context();
    let renderer = scene(&ctx);
    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    renderer.object().set("world", world);

    let err = renderer
        .create_render_job(&FrameBuffer::new(SIZE), TILE)
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::Commit(CommitError::NotCommitted { .. })
    ));
}

#[test]
fn test_render_hits_the_sphere_at_the_center() {
    let ctx = context();
    let renderer = scene(&ctx);
    let fb = render(&ctx, &renderer);

    let depth = fb.depth_at(20, 15).unwrap();
    approx::assert_relative_eq!(depth, 2.5, epsilon = 0.05);
    assert!(fb.pixel(20, 15).unwrap().b > 0.0);
    assert!(fb.depth_at(0, 0).unwrap().is_infinite());
    assert_eq!(fb.pixel(0, 0), Some(LinearRgba::BLACK));
}

#[test]
fn test_commit_is_idempotent() {
    let ctx = context();
    let renderer = scene(&ctx);
    let first = render(&ctx, &renderer);
    let bounds = renderer
        .create_render_job(&first, TILE)
        .unwrap()
        .world_bounds();

    let world = renderer.object().object_param("world").unwrap();
    world.commit(&ctx).unwrap();
    renderer.object().commit(&ctx).unwrap();

    let second = render(&ctx, &renderer);
    assert_eq!(first, second);
    assert_eq!(
        renderer
            .create_render_job(&second, TILE)
            .unwrap()
            .world_bounds(),
        bounds
    );
}

#[test]
fn test_job_keeps_its_snapshot_across_recommits() {
    let ctx = context();
    let renderer = scene(&ctx);
    let mut fb = FrameBuffer::new(SIZE);
    let job = renderer.create_render_job(&fb, TILE).unwrap();

    renderer.object().set("bgColor", Vec3::new(1.0, 0.0, 0.0));
    renderer.object().commit(&ctx).unwrap();

    job.render(&TileScheduler::new(2), ctx.kernel(), &mut fb, &CancelToken::new())
        .unwrap();
    assert_eq!(fb.pixel(0, 0), Some(LinearRgba::BLACK));

    let fresh = render(&ctx, &renderer);
    assert_eq!(fresh.pixel(0, 0), Some(LinearRgba::rgb(1.0, 0.0, 0.0)));
}

#[test]
fn test_cancelled_render_leaves_frame_buffer_unchanged() {
    let ctx = context();
    let renderer = scene(&ctx);
    let mut fb = FrameBuffer::new(SIZE);
    fb.clear(LinearRgba::WHITE);
    let before = fb.clone();

    let cancel = CancelToken::new();
    cancel.cancel();
    let job = renderer.create_render_job(&fb, TILE).unwrap();
    let err = job
        .render(&TileScheduler::new(2), ctx.kernel(), &mut fb, &cancel)
        .unwrap_err();
    assert!(matches!(err, RenderError::Cancelled { completed: 0, .. }));
    assert_eq!(fb, before);
}

#[test]
fn test_frame_size_mismatch() {
    let ctx = context();
    let renderer = scene(&ctx);
    let job = renderer
        .create_render_job(&FrameBuffer::new(SIZE), TILE)
        .unwrap();
    let mut other = FrameBuffer::new(Extent2D::new(8, 8));
    assert!(matches!(
        job.render(&TileScheduler::new(1), ctx.kernel(), &mut other, &CancelToken::new()),
        Err(RenderError::FrameSizeMismatch { .. })
    ));
}

#[test]
fn test_family_scoped_creation() {
    let ctx = context();
    let scivis = Renderer::create(&ctx, "raycast").unwrap();
    assert_eq!(scivis.family(), "scivis");
    assert!(scivis.create_light(&ctx, "PointLight").is_some());
    assert!(scivis.create_material(&ctx, "glass").is_none());

    let obj = Renderer::create(&ctx, "OBJ").unwrap();
    assert_eq!(obj.family(), "obj");
    assert_eq!(
        obj.create_material(&ctx, "anything").unwrap().type_name(),
        "OBJMaterial"
    );
    assert!(obj.create_light(&ctx, "ambient").is_none());

    assert!(matches!(
        Renderer::create(&ctx, "pathtracer"),
        Err(RenderError::Registry(_))
    ));
}
