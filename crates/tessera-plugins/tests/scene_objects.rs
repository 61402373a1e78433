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


//! Committing the built-in object types against the CPU kernel.

use approx::assert_relative_eq;
use std::sync::Arc;
use tessera_core::context::RenderContext;
use tessera_core::error::CommitError;
use tessera_core::kernel::Sphere;
use tessera_core::math::{Vec3, Vec3i};
use tessera_core::object::{ObjectCategory, ObjectRef};
use tessera_core::param::DataBuffer;
use tessera_core::registry::TypeRegistry;
use tessera_infra::CpuKernel;

fn context() -> RenderContext {
    let registry = Arc::new(TypeRegistry::new());
    tessera_plugins::install(&registry);
    RenderContext::new(registry, Arc::new(CpuKernel::new()))
}

fn spheres(ctx: &RenderContext, centers: &[Vec3], radius: f32) -> ObjectRef {
    let geometry = ctx.create(ObjectCategory::Geometry, "spheres").unwrap();
    geometry.set("spheres", DataBuffer::from_slice(centers));
    geometry.set("radius", radius);
    geometry
}

fn invalid_param(err: CommitError) -> String {
    match err {
        CommitError::InvalidParameter { param, .. } => param,
        other => panic!("expected an invalid parameter, got {other}"),
    }
}

#[test]
fn test_world_unions_child_bounds() {
    let ctx = context();
    let a = spheres(&ctx, &[Vec3::new(-1.0, 0.0, 0.0)], 0.5);
    let b = spheres(&ctx, &[Vec3::new(2.0, 1.0, 0.0)], 0.25);
    a.commit(&ctx).unwrap();
    b.commit(&ctx).unwrap();

    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    world.set("geometry", vec![a, b]);
    world.set("id", 3);
    world.commit(&ctx).unwrap();

    let bounds = world.compiled().unwrap().bounds().unwrap();
    assert_relative_eq!(bounds.min.x, -1.5);
    assert_relative_eq!(bounds.max.x, 2.25);
    assert_relative_eq!(bounds.max.y, 1.25);
}

#[test]
fn test_world_requires_committed_children() {
    let ctx = context();
    let child = spheres(&ctx, &[Vec3::ZERO], 0.1);
    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    world.set("geometry", child.clone());

    assert!(matches!(
        world.commit(&ctx),
        Err(CommitError::UncommittedDependency { ref param, .. }) if param == "geometry"
    ));
    child.commit(&ctx).unwrap();
    world.commit(&ctx).unwrap();

    child.set("radius", 0.2_f32);
    child.commit(&ctx).unwrap();
    assert!(world.is_stale());
}

#[test]
fn test_empty_world_has_no_bounds() {
    let ctx = context();
    let world = ctx.create(ObjectCategory::World, "world").unwrap();
    world.commit(&ctx).unwrap();
    assert!(world.compiled().unwrap().bounds().is_none());
}

#[test]
fn test_structured_volume_checks_sample_count() {
    let ctx = context();
    let volume = ctx
        .create(ObjectCategory::Volume, "shared_structured_volume")
        .unwrap();
    volume.set("dimensions", Vec3i::new(2, 2, 2));
    volume.set("data", DataBuffer::from_slice(&[0.5_f32; 7]));
    assert_eq!(invalid_param(volume.commit(&ctx).unwrap_err()), "data");

    volume.set("data", DataBuffer::from_slice(&[0.5_f32; 8]));
    volume.set("gridOrigin", Vec3::new(1.0, 0.0, 0.0));
    volume.set("gridSpacing", Vec3::splat(2.0));
    volume.commit(&ctx).unwrap();
    let bounds = volume.compiled().unwrap().bounds().unwrap();
    assert_relative_eq!(bounds.min.x, 1.0);
    assert_relative_eq!(bounds.max.x, 3.0);
}

#[test]
fn test_structured_volume_requires_dimensions() {
    let ctx = context();
    let volume = ctx
        .create(ObjectCategory::Volume, "structured_regular")
        .unwrap();
    volume.set("data", DataBuffer::from_slice(&[1.0_f32]));
    assert_eq!(
        volume.commit(&ctx).unwrap_err(),
        CommitError::MissingParameter {
            object_type: "structured_regular".into(),
            param: "dimensions".into(),
        }
    );
}

#[test]
fn test_unstructured_volume_bounds_and_values() {
    let ctx = context();
    let volume = ctx
        .create(ObjectCategory::Volume, "vkl_unstructured_volume")
        .unwrap();
    let positions = [
        Vec3::ZERO,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    volume.set("vertex.position", DataBuffer::from_slice(&positions));
    volume.set("index", DataBuffer::from_slice(&[[0_u32, 1, 2, 3]]));
    volume.set("vertex.value", DataBuffer::from_slice(&[1.0_f32, 2.0]));
    assert_eq!(invalid_param(volume.commit(&ctx).unwrap_err()), "vertex.value");

    volume.remove("vertex.value");
    volume.commit(&ctx).unwrap();
    let bounds = volume.compiled().unwrap().bounds().unwrap();
    assert_relative_eq!(bounds.max.z, 1.0);
}

#[test]
fn test_camera_validation() {
    let ctx = context();
    let perspective = ctx.create(ObjectCategory::Camera, "perspective").unwrap();
    perspective.set("fovy", 180.0_f32);
    assert_eq!(invalid_param(perspective.commit(&ctx).unwrap_err()), "fovy");

    perspective.set("fovy", 45.0_f32);
    perspective.set("up", Vec3::new(0.0, 0.0, -2.0));
    assert_eq!(invalid_param(perspective.commit(&ctx).unwrap_err()), "up");

    let ortho = ctx.create(ObjectCategory::Camera, "orthographic").unwrap();
    ortho.set("height", 0.0_f32);
    assert_eq!(invalid_param(ortho.commit(&ctx).unwrap_err()), "height");
    ortho.set("height", 2.0_f32);
    ortho.commit(&ctx).unwrap();
}

#[test]
fn test_light_and_material_validation() {
    let ctx = context();
    let distant = ctx.create(ObjectCategory::Light, "distant").unwrap();
    distant.set("direction", Vec3::ZERO);
    assert_eq!(invalid_param(distant.commit(&ctx).unwrap_err()), "direction");

    let point = ctx.create(ObjectCategory::Light, "PointLight").unwrap();
    point.set("position", Vec3::new(0.0, 2.0, 0.0));
    point.set("color", "red");
    assert_eq!(invalid_param(point.commit(&ctx).unwrap_err()), "color");

    let material = ctx.create(ObjectCategory::Material, "obj").unwrap();
    material.set("d", 1.5_f32);
    assert_eq!(invalid_param(material.commit(&ctx).unwrap_err()), "d");
    material.set("d", 0.5_f32);
    material.commit(&ctx).unwrap();
}

#[test]
fn test_spheres_with_per_sphere_radius() {
    let ctx = context();
    let data = [
        Sphere {
            center: Vec3::ZERO,
            radius: 1.0,
        },
        Sphere {
            center: Vec3::new(4.0, 0.0, 0.0),
            radius: 0.5,
        },
    ];
    let geometry = ctx.create(ObjectCategory::Geometry, "spheres").unwrap();
    geometry.set("spheres", DataBuffer::from_slice(&data));
    geometry.set("bytes_per_sphere", 16);
    geometry.set("offset_radius", 12);
    geometry.commit(&ctx).unwrap();

    let bounds = geometry.compiled().unwrap().bounds().unwrap();
    assert_relative_eq!(bounds.min.x, -1.0);
    assert_relative_eq!(bounds.max.x, 4.5);
}
