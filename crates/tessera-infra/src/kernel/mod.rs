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


//! A deterministic CPU reference kernel.
//!
//! Spheres are intersected by brute force against a per-geometry bounding
//! box, volumes are ray-marched as absorbing media, and surfaces are shaded
//! with Lambert diffuse plus a Blinn-Phong highlight. With more than one
//! sample per pixel, sample positions come from a hash of the pixel and
//! sample index, so the same scene always renders the same image.

mod scene;

use scene::{CpuCamera, CpuGeometry, CpuRenderer, CpuVolume, CpuWorld, Ray, SurfaceHit};
use tessera_core::error::KernelError;
use tessera_core::framebuffer::Tile;
use tessera_core::kernel::*;
use tessera_core::math::{Aabb, LinearRgba, Vec3};

/// Ray-march steps through each volume.
const VOLUME_STEPS: u32 = 16;
/// Extinction of a fully dense volume per world unit.
const VOLUME_DENSITY: f32 = 4.0;

/// The reference kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpuKernel;

impl CpuKernel {
    /// Creates the kernel.
    pub fn new() -> Self {
        Self
    }
}

impl ComputeKernel for CpuKernel {
    fn name(&self) -> &str {
        "cpu-reference"
    }

    fn compile_geometry(&self, desc: &GeometryDesc) -> Result<KernelObject, KernelError> {
        match desc {
            GeometryDesc::Spheres { spheres, material } => {
                let material = match material {
                    Some(handle) => *handle.expect_ref::<MaterialDesc>()?,
                    None => MaterialDesc::default(),
                };
                let bounds = spheres
                    .iter()
                    .fold(Aabb::INVALID, |acc, s| acc.union(&s.bounds()));
                Ok(KernelObject {
                    handle: KernelHandle::new(CpuGeometry {
                        spheres: spheres.clone(),
                        material,
                        bounds,
                    }),
                    bounds,
                })
            }
        }
    }

    fn compile_volume(&self, desc: &VolumeDesc) -> Result<KernelObject, KernelError> {
        let volume = match desc {
            VolumeDesc::StructuredRegular {
                dimensions,
                origin,
                spacing,
                values,
            } => {
                if dimensions.x < 1 || dimensions.y < 1 || dimensions.z < 1 {
                    return Err(KernelError::InvalidInput(format!(
                        "grid dimensions {dimensions:?} must be positive"
                    )));
                }
                if values.len() as i64 != dimensions.product() {
                    return Err(KernelError::InvalidInput(format!(
                        "{} values for a {:?} grid",
                        values.len(),
                        dimensions
                    )));
                }
                let range = values
                    .iter()
                    .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                        (lo.min(*v), hi.max(*v))
                    });
                let cells = Vec3::new(
                    (dimensions.x - 1) as f32,
                    (dimensions.y - 1) as f32,
                    (dimensions.z - 1) as f32,
                );
                let extent = cells * *spacing;
                CpuVolume::Structured {
                    dimensions: *dimensions,
                    origin: *origin,
                    spacing: *spacing,
                    values: values.clone(),
                    range,
                    bounds: Aabb::from_min_max(*origin, *origin + extent),
                }
            }
            VolumeDesc::Unstructured {
                positions,
                cells,
                values,
            } => {
                let bounds = Aabb::from_points(positions.iter().copied())
                    .ok_or_else(|| KernelError::InvalidInput("volume has no vertices".into()))?;
                if let Some(cell) = cells
                    .iter()
                    .find(|cell| cell.iter().any(|&i| i as usize >= positions.len()))
                {
                    return Err(KernelError::InvalidInput(format!(
                        "cell {cell:?} indexes past {} vertices",
                        positions.len()
                    )));
                }
                let density = if values.is_empty() {
                    1.0
                } else {
                    let (lo, hi) = values
                        .iter()
                        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                            (lo.min(*v), hi.max(*v))
                        });
                    let mean = values.iter().sum::<f32>() / values.len() as f32;
                    if hi > lo {
                        (mean - lo) / (hi - lo)
                    } else {
                        1.0
                    }
                };
                CpuVolume::Unstructured { density, bounds }
            }
        };
        let bounds = volume.bounds();
        Ok(KernelObject {
            handle: KernelHandle::new(volume),
            bounds,
        })
    }

    fn compile_material(&self, desc: &MaterialDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(*desc))
    }

    fn compile_light(&self, desc: &LightDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(*desc))
    }

    fn compile_camera(&self, desc: &CameraDesc) -> Result<KernelHandle, KernelError> {
        Ok(KernelHandle::new(CpuCamera::from_desc(desc)?))
    }

    fn compile_world(&self, desc: &WorldDesc) -> Result<KernelObject, KernelError> {
        let mut bounds = Aabb::INVALID;
        for geometry in &desc.geometries {
            bounds = bounds.union(&geometry.expect_ref::<CpuGeometry>()?.bounds);
        }
        for volume in &desc.volumes {
            bounds = bounds.union(&volume.expect_ref::<CpuVolume>()?.bounds());
        }
        Ok(KernelObject {
            handle: KernelHandle::new(CpuWorld {
                id: desc.id,
                geometries: desc.geometries.clone(),
                volumes: desc.volumes.clone(),
            }),
            bounds,
        })
    }

    fn compile_renderer(&self, desc: &RendererDesc) -> Result<KernelHandle, KernelError> {
        let lights = desc
            .lights
            .iter()
            .map(|light| light.expect_ref::<LightDesc>().copied())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KernelHandle::new(CpuRenderer {
            spp: desc.spp.max(1),
            background: desc.background,
            lights,
        }))
    }

    fn render_tile(
        &self,
        tile: &mut Tile,
        renderer: &KernelHandle,
        camera: &KernelHandle,
        world: &KernelHandle,
    ) -> Result<(), KernelError> {
        tile.validate()?;
        let renderer = renderer.expect_ref::<CpuRenderer>()?;
        let camera = camera.expect_ref::<CpuCamera>()?;
        let world = world.expect_ref::<CpuWorld>()?;
        let geometries = world
            .geometries
            .iter()
            .map(|g| g.expect_ref::<CpuGeometry>())
            .collect::<Result<Vec<_>, _>>()?;
        let volumes = world
            .volumes
            .iter()
            .map(|v| v.expect_ref::<CpuVolume>())
            .collect::<Result<Vec<_>, _>>()?;

        let rect = tile.rect();
        let frame = tile.frame_size();
        let weight = 1.0 / renderer.spp as f32;
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                let mut color = LinearRgba::TRANSPARENT;
                let mut depth = f32::INFINITY;
                for sample in 0..renderer.spp {
                    let (jx, jy) = if renderer.spp == 1 {
                        (0.5, 0.5)
                    } else {
                        jitter(x, y, sample)
                    };
                    let u = (x as f32 + jx) / frame.width as f32;
                    let v = 1.0 - (y as f32 + jy) / frame.height as f32;
                    let (c, d) = trace(&camera.ray(u, v), renderer, &geometries, &volumes);
                    color = color + c * weight;
                    depth = depth.min(d);
                }
                tile.write(x, y, color, depth);
            }
        }
        log::trace!(
            "CpuKernel: world {} tile ({}, {}) {}x{}",
            world.id,
            rect.x,
            rect.y,
            rect.width,
            rect.height
        );
        Ok(())
    }
}

/// Returns the color and depth seen along `ray`.
fn trace(
    ray: &Ray,
    renderer: &CpuRenderer,
    geometries: &[&CpuGeometry],
    volumes: &[&CpuVolume],
) -> (LinearRgba, f32) {
    let mut nearest: Option<SurfaceHit> = None;
    for geometry in geometries {
        let limit = nearest.map_or(f32::INFINITY, |h| h.t);
        if let Some(hit) = geometry.intersect(ray, limit) {
            nearest = Some(hit);
        }
    }
    let t_surface = nearest.map_or(f32::INFINITY, |h| h.t);

    let mut transmittance = 1.0;
    let mut emitted = 0.0;
    let mut depth = t_surface;
    for volume in volumes {
        let Some((t0, t1)) = volume.bounds().intersect_ray(ray.origin, ray.dir) else {
            continue;
        };
        let t1 = t1.min(t_surface);
        if t1 <= t0 {
            continue;
        }
        depth = depth.min(t0);
        let step = (t1 - t0) / VOLUME_STEPS as f32;
        for i in 0..VOLUME_STEPS {
            let p = ray.at(t0 + (i as f32 + 0.5) * step);
            let density = volume.sample(p) * VOLUME_DENSITY;
            let absorbed = 1.0 - (-density * step).exp();
            emitted += transmittance * absorbed * volume.sample(p);
            transmittance *= 1.0 - absorbed;
        }
    }

    let behind = match nearest {
        Some(hit) => shade(ray, &hit, &renderer.lights),
        None => renderer.background,
    };
    if depth.is_infinite() {
        return (behind, depth);
    }
    let glow = LinearRgba::new(emitted, emitted, emitted, 1.0 - transmittance);
    (glow + behind * transmittance, depth)
}

fn shade(ray: &Ray, hit: &SurfaceHit, lights: &[LightDesc]) -> LinearRgba {
    let material = &hit.material;
    let mut n = hit.normal;
    if n.dot(ray.dir) > 0.0 {
        n = -n;
    }
    let p = ray.at(hit.t);
    let view = -ray.dir;

    let mut radiance = Vec3::ZERO;
    for light in lights {
        let (to_light, color, intensity) = match *light {
            LightDesc::Ambient { color, intensity } => {
                radiance = radiance + material.kd * color * intensity;
                continue;
            }
            LightDesc::Distant {
                direction,
                color,
                intensity,
            } => (-direction, color, intensity),
            LightDesc::Point {
                position,
                color,
                intensity,
            } => ((position - p).normalize(), color, intensity),
        };
        let lambert = n.dot(to_light).max(0.0);
        if lambert == 0.0 {
            continue;
        }
        let half = (to_light + view).normalize();
        let specular = n.dot(half).max(0.0).powf(material.ns);
        radiance = radiance + (material.kd * lambert + material.ks * specular) * color * intensity;
    }

    let mut shaded = LinearRgba::from_vec3(radiance);
    shaded.a = material.d;
    shaded
}

/// Sub-pixel offset in `[0, 1)^2` for a pixel sample.
fn jitter(x: u32, y: u32, sample: u32) -> (f32, f32) {
    let h = hash(
        x.wrapping_mul(0x9E37_79B9) ^ y.wrapping_mul(0x85EB_CA6B) ^ sample.wrapping_mul(0xC2B2_AE35),
    );
    let to_unit = |bits: u32| (bits >> 8) as f32 / (1u32 << 24) as f32;
    (to_unit(h), to_unit(hash(h)))
}

fn hash(mut v: u32) -> u32 {
    v ^= v >> 16;
    v = v.wrapping_mul(0x7FEB_352D);
    v ^= v >> 15;
    v = v.wrapping_mul(0x846C_A68B);
    v ^= v >> 16;
    v
}
