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

//! Marshalled object state handed to the compute kernel.

use super::KernelHandle;
use crate::math::{Aabb, LinearRgba, Vec3, Vec3i};
use std::sync::Arc;

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Sphere {
    /// Center position.
    pub center: Vec3,
    /// Radius.
    pub radius: f32,
}

impl Sphere {
    /// Bounds of the sphere.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_sphere(self.center, self.radius)
    }
}

/// Surface geometry.
#[derive(Debug, Clone)]
pub enum GeometryDesc {
    /// A set of spheres sharing one material.
    Spheres {
        /// The primitives.
        spheres: Vec<Sphere>,
        /// Compiled material, if bound.
        material: Option<KernelHandle>,
    },
}

/// A volumetric scalar field.
#[derive(Debug, Clone)]
pub enum VolumeDesc {
    /// Scalars on a regular grid.
    StructuredRegular {
        /// Samples per axis.
        dimensions: Vec3i,
        /// World position of the first sample.
        origin: Vec3,
        /// Distance between samples on each axis.
        spacing: Vec3,
        /// `dimensions.product()` samples, x fastest.
        values: Arc<[f32]>,
    },
    /// Scalars on tetrahedral cells.
    Unstructured {
        /// Vertex positions.
        positions: Arc<[Vec3]>,
        /// Four vertex indices per cell.
        cells: Arc<[[u32; 4]]>,
        /// One value per vertex; empty means a constant field.
        values: Arc<[f32]>,
    },
}

/// An OBJ-style material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialDesc {
    /// Diffuse reflectance.
    pub kd: Vec3,
    /// Specular reflectance.
    pub ks: Vec3,
    /// Specular exponent.
    pub ns: f32,
    /// Opacity.
    pub d: f32,
}

impl Default for MaterialDesc {
    fn default() -> Self {
        Self {
            kd: Vec3::splat(0.8),
            ks: Vec3::ZERO,
            ns: 10.0,
            d: 1.0,
        }
    }
}

/// A light source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightDesc {
    /// Uniform light from every direction.
    Ambient {
        /// Color.
        color: Vec3,
        /// Scale applied to the color.
        intensity: f32,
    },
    /// Light from infinitely far away.
    Distant {
        /// Direction the light travels in.
        direction: Vec3,
        /// Color.
        color: Vec3,
        /// Scale applied to the color.
        intensity: f32,
    },
    /// Light emitted from a point.
    Point {
        /// Position.
        position: Vec3,
        /// Color.
        color: Vec3,
        /// Scale applied to the color.
        intensity: f32,
    },
}

/// Viewpoint and projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraDesc {
    /// Pinhole projection.
    Perspective {
        /// Eye position.
        position: Vec3,
        /// Viewing direction.
        direction: Vec3,
        /// Up vector.
        up: Vec3,
        /// Vertical field of view in degrees.
        fovy: f32,
        /// Width over height of the image plane.
        aspect: f32,
    },
    /// Parallel projection.
    Orthographic {
        /// Center of the image plane.
        position: Vec3,
        /// Viewing direction.
        direction: Vec3,
        /// Up vector.
        up: Vec3,
        /// Height of the image plane in world units.
        height: f32,
        /// Width over height of the image plane.
        aspect: f32,
    },
}

/// Compiled children of a world.
#[derive(Debug, Clone, Default)]
pub struct WorldDesc {
    /// Identifier of the world, e.g. the owning rank.
    pub id: i32,
    /// Compiled geometries.
    pub geometries: Vec<KernelHandle>,
    /// Compiled volumes.
    pub volumes: Vec<KernelHandle>,
    /// Union of the children's bounds.
    pub bounds: Aabb,
}

/// Renderer settings shared by every tile of a job.
#[derive(Debug, Clone)]
pub struct RendererDesc {
    /// Implementation family of the renderer.
    pub family: &'static str,
    /// Samples per pixel, at least one.
    pub spp: u32,
    /// Color of pixels hit by nothing.
    pub background: LinearRgba,
    /// Compiled lights.
    pub lights: Vec<KernelHandle>,
}
