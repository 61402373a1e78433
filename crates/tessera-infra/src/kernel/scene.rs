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


//! Compiled state of the CPU kernel and the ray queries against it.

use tessera_core::error::KernelError;
use tessera_core::kernel::{CameraDesc, KernelHandle, LightDesc, MaterialDesc, Sphere};
use tessera_core::math::{Aabb, LinearRgba, Vec3, Vec3i};

/// A ray with a normalized direction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

/// The nearest surface hit along a ray.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfaceHit {
    pub t: f32,
    pub normal: Vec3,
    pub material: MaterialDesc,
}

pub(crate) struct CpuGeometry {
    pub spheres: Vec<Sphere>,
    pub material: MaterialDesc,
    pub bounds: Aabb,
}

impl CpuGeometry {
    pub fn intersect(&self, ray: &Ray, t_max: f32) -> Option<SurfaceHit> {
        self.bounds.intersect_ray(ray.origin, ray.dir)?;
        let mut nearest: Option<(f32, &Sphere)> = None;
        for sphere in &self.spheres {
            let oc = ray.origin - sphere.center;
            let b = oc.dot(ray.dir);
            let c = oc.length_squared() - sphere.radius * sphere.radius;
            let disc = b * b - c;
            if disc < 0.0 {
                continue;
            }
            let root = disc.sqrt();
            let t = if -b - root > 1e-4 { -b - root } else { -b + root };
            let limit = nearest.map_or(t_max, |(best, _)| best);
            if t > 1e-4 && t < limit {
                nearest = Some((t, sphere));
            }
        }
        nearest.map(|(t, sphere)| SurfaceHit {
            t,
            normal: (ray.at(t) - sphere.center).normalize(),
            material: self.material,
        })
    }
}

pub(crate) enum CpuVolume {
    Structured {
        dimensions: Vec3i,
        origin: Vec3,
        spacing: Vec3,
        values: std::sync::Arc<[f32]>,
        range: (f32, f32),
        bounds: Aabb,
    },
    Unstructured {
        density: f32,
        bounds: Aabb,
    },
}

impl CpuVolume {
    pub fn bounds(&self) -> Aabb {
        match self {
            CpuVolume::Structured { bounds, .. } | CpuVolume::Unstructured { bounds, .. } => *bounds,
        }
    }

    /// Normalized field value in `[0, 1]` at `p`.
    pub fn sample(&self, p: Vec3) -> f32 {
        match self {
            CpuVolume::Structured {
                dimensions,
                origin,
                spacing,
                values,
                range,
                ..
            } => {
                let mut index = [0_usize; 3];
                for axis in 0..3 {
                    let cell = if spacing[axis] == 0.0 {
                        0.0
                    } else {
                        ((p[axis] - origin[axis]) / spacing[axis]).round()
                    };
                    index[axis] = cell.clamp(0.0, (dimensions[axis] - 1) as f32) as usize;
                }
                let (nx, ny) = (dimensions.x as usize, dimensions.y as usize);
                let value = values[index[0] + nx * (index[1] + ny * index[2])];
                let span = range.1 - range.0;
                if span > 0.0 {
                    (value - range.0) / span
                } else {
                    1.0
                }
            }
            CpuVolume::Unstructured { density, .. } => *density,
        }
    }
}

pub(crate) enum CpuCamera {
    Perspective {
        origin: Vec3,
        forward: Vec3,
        right: Vec3,
        up: Vec3,
        half_height: f32,
        aspect: f32,
    },
    Orthographic {
        origin: Vec3,
        forward: Vec3,
        right: Vec3,
        up: Vec3,
        height: f32,
        aspect: f32,
    },
}

impl CpuCamera {
    pub fn from_desc(desc: &CameraDesc) -> Result<Self, KernelError> {
        let basis = |direction: Vec3, up: Vec3| {
            let forward = direction.normalize();
            let right = forward.cross(up).normalize();
            if right.length_squared() == 0.0 {
                return Err(KernelError::InvalidInput(
                    "camera up is parallel to its direction".into(),
                ));
            }
            Ok((forward, right, right.cross(forward)))
        };
        Ok(match *desc {
            CameraDesc::Perspective {
                position,
                direction,
                up,
                fovy,
                aspect,
            } => {
                let (forward, right, up) = basis(direction, up)?;
                CpuCamera::Perspective {
                    origin: position,
                    forward,
                    right,
                    up,
                    half_height: (fovy.to_radians() * 0.5).tan(),
                    aspect,
                }
            }
            CameraDesc::Orthographic {
                position,
                direction,
                up,
                height,
                aspect,
            } => {
                let (forward, right, up) = basis(direction, up)?;
                CpuCamera::Orthographic {
                    origin: position,
                    forward,
                    right,
                    up,
                    height,
                    aspect,
                }
            }
        })
    }

    /// The ray through image coordinates `(u, v)` in `[0, 1]`, `v` pointing up.
    pub fn ray(&self, u: f32, v: f32) -> Ray {
        let (su, sv) = (u - 0.5, v - 0.5);
        match *self {
            CpuCamera::Perspective {
                origin,
                forward,
                right,
                up,
                half_height,
                aspect,
            } => Ray {
                origin,
                dir: (forward + right * (2.0 * su * half_height * aspect) + up * (2.0 * sv * half_height))
                    .normalize(),
            },
            CpuCamera::Orthographic {
                origin,
                forward,
                right,
                up,
                height,
                aspect,
            } => Ray {
                origin: origin + right * (su * height * aspect) + up * (sv * height),
                dir: forward,
            },
        }
    }
}

pub(crate) struct CpuWorld {
    pub id: i32,
    pub geometries: Vec<KernelHandle>,
    pub volumes: Vec<KernelHandle>,
}

pub(crate) struct CpuRenderer {
    pub spp: u32,
    pub background: LinearRgba,
    pub lights: Vec<LightDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_nearest_sphere_wins() {
        let geometry = CpuGeometry {
            spheres: vec![
                Sphere {
                    center: Vec3::new(0.0, 0.0, -5.0),
                    radius: 1.0,
                },
                Sphere {
                    center: Vec3::new(0.0, 0.0, -3.0),
                    radius: 0.5,
                },
            ],
            material: MaterialDesc::default(),
            bounds: Aabb::from_min_max(Vec3::new(-1.0, -1.0, -6.0), Vec3::new(1.0, 1.0, -2.5)),
        };
        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::NEG_Z,
        };
        let hit = geometry.intersect(&ray, f32::INFINITY).unwrap();
        assert_relative_eq!(hit.t, 2.5);
        assert_relative_eq!(hit.normal.z, 1.0);
        assert!(geometry.intersect(&ray, 2.0).is_none());
    }

    #[test]
    fn test_perspective_center_ray_follows_direction() {
        let camera = CpuCamera::from_desc(&CameraDesc::Perspective {
            position: Vec3::new(0.0, 0.0, 3.0),
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
            fovy: 60.0,
            aspect: 1.0,
        })
        .unwrap();
        let ray = camera.ray(0.5, 0.5);
        assert_relative_eq!(ray.dir.z, -1.0);
        let up_ray = camera.ray(0.5, 1.0);
        assert!(up_ray.dir.y > 0.0);
    }
}
