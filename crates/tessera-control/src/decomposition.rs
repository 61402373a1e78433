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


//! Domain decomposition and rank-local data.
//!
//! The global domain is cut into one brick per rank along the [`Grid`]. A
//! rank only generates primitives inside its own brick, shrunk by the
//! primitive radius, so no primitive crosses a brick face and the union of
//! all ranks' data partitions the dataset.

use crate::error::{DecompositionError, FrameError};
use crate::topology::{brick_coord, BrickCoord, Grid, RankTopology};
use tessera_core::context::RenderContext;
use tessera_core::kernel::Sphere;
use tessera_core::math::{Aabb, Vec3};
use tessera_core::object::{ObjectCategory, ObjectRef};
use tessera_core::param::DataBuffer;
use tessera_lanes::Renderer;

/// The global domain cut along a brick grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainDecomposition {
    domain: Aabb,
    grid: Grid,
}

impl DomainDecomposition {
    /// Cuts `domain` along `grid`.
    pub fn new(domain: Aabb, grid: Grid) -> Self {
        Self { domain, grid }
    }

    /// Cuts `domain` along the grid of `topology`.
    pub fn for_topology(domain: Aabb, topology: &RankTopology) -> Self {
        Self::new(domain, topology.grid())
    }

    /// The whole domain.
    pub fn domain(&self) -> Aabb {
        self.domain
    }

    /// The brick grid.
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Extent of one brick on each axis.
    pub fn brick_size(&self) -> Vec3 {
        self.domain.size() / grid_vec(self.grid.to_array())
    }

    /// Bounds of the brick at `coord`.
    pub fn brick_bounds(&self, coord: BrickCoord) -> Aabb {
        let size = self.brick_size();
        let [x, y, z] = coord.to_array();
        let lower = self.domain.min + size * grid_vec([x, y, z]);
        let upper = self.domain.min + size * grid_vec([x + 1, y + 1, z + 1]);
        Aabb::from_min_max(lower, upper)
    }

    /// Bounds of the brick owned by `rank`.
    pub fn rank_bounds(&self, rank: usize) -> Aabb {
        self.brick_bounds(brick_coord(self.grid, rank))
    }

    /// The brick at `coord` shrunk by `padding` on every face.
    pub fn padded_bounds(&self, coord: BrickCoord, padding: f32) -> Aabb {
        self.brick_bounds(coord).shrink(padding)
    }
}

fn grid_vec(v: [usize; 3]) -> Vec3 {
    Vec3::new(v[0] as f32, v[1] as f32, v[2] as f32)
}

/// Generates `count` spheres of `radius` lying entirely inside `bounds`.
///
/// Centers are drawn uniformly from `bounds` shrunk by `radius`. The same
/// `seed` always yields the same spheres.
pub fn generate_local_spheres(
    bounds: &Aabb,
    count: usize,
    radius: f32,
    seed: u64,
) -> Result<Vec<Sphere>, DecompositionError> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(DecompositionError::InvalidRadius(radius));
    }
    let size = bounds.size();
    if (0..3).any(|axis| size[axis] < 2.0 * radius) {
        return Err(DecompositionError::BrickTooSmall {
            radius,
            size: size.to_array(),
        });
    }

    let padded = bounds.shrink(radius);
    let extent = padded.size();
    let rng = fastrand::Rng::with_seed(seed);
    let spheres = (0..count)
        .map(|_| {
            let u = Vec3::new(rng.f32(), rng.f32(), rng.f32());
            let center = (padded.min + extent * u).max(padded.min).min(padded.max);
            Sphere { center, radius }
        })
        .collect();
    Ok(spheres)
}

/// How many spheres each rank generates, and how large.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSettings {
    /// Spheres per rank.
    pub count: usize,
    /// Radius of every sphere.
    pub radius: f32,
    /// Base seed; each rank mixes in its id.
    pub seed: u64,
}

impl Default for SphereSettings {
    fn default() -> Self {
        Self {
            count: 10,
            radius: 0.1,
            seed: 0x7E55_E7A,
        }
    }
}

/// A rank's committed sphere geometry.
#[derive(Debug, Clone)]
pub struct LocalSpheres {
    /// The committed `spheres` geometry.
    pub geometry: ObjectRef,
    /// Its material, if the renderer's family provides one.
    pub material: Option<ObjectRef>,
    /// The generated primitives.
    pub spheres: Vec<Sphere>,
    /// The rank's brick.
    pub brick: Aabb,
}

/// Builds and commits the spheres of the rank described by `topology`.
///
/// The material is an `OBJMaterial` whose blue diffuse channel grows with the
/// rank, so every rank's contribution is told apart in the composite.
pub fn make_local_spheres(
    context: &RenderContext,
    renderer: &Renderer,
    topology: &RankTopology,
    decomposition: &DomainDecomposition,
    settings: &SphereSettings,
) -> Result<LocalSpheres, FrameError> {
    let rank = topology.rank();
    let brick = decomposition.brick_bounds(topology.coord());
    let seed = settings.seed ^ (rank as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let spheres = generate_local_spheres(&brick, settings.count, settings.radius, seed)?;

    let material = renderer.create_material(context, "OBJMaterial");
    match &material {
        Some(material) => {
            let blue = (rank as f32 + 1.0) / topology.world_size() as f32;
            material.set("Kd", Vec3::new(0.0, 0.0, blue));
            material.set("Ks", Vec3::ONE);
            commit(context, material)?;
        }
        None => log::warn!(
            "Decomposition: renderer family '{}' has no OBJMaterial, rank {} spheres stay unshaded",
            renderer.family(),
            rank
        ),
    }

    let centers: Vec<Vec3> = spheres.iter().map(|s| s.center).collect();
    let geometry = context.create(ObjectCategory::Geometry, "spheres")?;
    geometry.set("spheres", DataBuffer::from_slice(&centers));
    geometry.set("bytes_per_sphere", std::mem::size_of::<Vec3>() as i32);
    geometry.set("radius", settings.radius);
    if let Some(material) = &material {
        geometry.set("material", material.clone());
    }
    commit(context, &geometry)?;

    log::debug!(
        "Decomposition: rank {} brick {} holds {} spheres",
        rank,
        topology.coord(),
        spheres.len()
    );
    Ok(LocalSpheres {
        geometry,
        material,
        spheres,
        brick,
    })
}

fn commit(context: &RenderContext, object: &ObjectRef) -> Result<u64, FrameError> {
    object.commit(context).map_err(|source| FrameError::Commit {
        object_type: object.type_name().to_string(),
        source,
    })
}
