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


//! Sphere geometry.

use tessera_core::error::CommitError;
use tessera_core::kernel::{GeometryDesc, Sphere};
use tessera_core::math::Vec3;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};

/// Default radius of spheres without a per-sphere radius.
pub const DEFAULT_RADIUS: f32 = 0.01;

/// A set of spheres read from a strided `spheres` data buffer.
///
/// | parameter | type | default |
/// |---|---|---|
/// | `spheres` | data | required |
/// | `bytes_per_sphere` | int | 12 |
/// | `offset_center` | int | 0 |
/// | `offset_radius` | int | -1 (use `radius`) |
/// | `radius` | float | 0.01 |
/// | `material` | object | none |
#[derive(Debug, Default)]
pub struct Spheres;

impl ObjectKind for Spheres {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Geometry
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let data = params.require_data("spheres")?;
        let stride = params.int_or("bytes_per_sphere", 12)?;
        let offset_center = params.int_or("offset_center", 0)?;
        let offset_radius = params.int_or("offset_radius", -1)?;
        let radius = params.float_or("radius", DEFAULT_RADIUS)?;

        let center_size = std::mem::size_of::<Vec3>() as i32;
        if stride < center_size {
            return Err(params.invalid(
                "bytes_per_sphere",
                "at least 12 bytes",
                &stride.to_string(),
            ));
        }
        if offset_center < 0 || offset_center + center_size > stride {
            return Err(params.invalid(
                "offset_center",
                "a center inside bytes_per_sphere",
                &offset_center.to_string(),
            ));
        }
        if offset_radius + 4 > stride {
            return Err(params.invalid(
                "offset_radius",
                "a radius inside bytes_per_sphere",
                &offset_radius.to_string(),
            ));
        }
        if radius <= 0.0 {
            return Err(params.invalid("radius", "positive float", &radius.to_string()));
        }

        let elements = data.with_stride(stride as usize);
        let centers = elements
            .read_all::<Vec3>(offset_center as usize)
            .unwrap_or_default();
        let radii = if offset_radius >= 0 {
            elements.read_all::<f32>(offset_radius as usize)
        } else {
            None
        };
        let spheres = centers
            .into_iter()
            .enumerate()
            .map(|(i, center)| Sphere {
                center,
                radius: radii.as_ref().map_or(radius, |r| r[i]),
            })
            .collect();

        let material = scope
            .optional_dependency("material")?
            .map(|m| m.handle().clone());

        let compiled = scope
            .kernel()
            .compile_geometry(&GeometryDesc::Spheres { spheres, material })
            .map_err(|e| scope.kernel_error(e))?;
        let form = CompiledForm::new(compiled.handle);
        Ok(if compiled.bounds.is_valid() {
            form.with_bounds(compiled.bounds)
        } else {
            form
        })
    }
}
