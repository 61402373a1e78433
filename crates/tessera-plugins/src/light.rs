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


//! Light kinds. Every light reads `color` (vec3f, default white) and
//! `intensity` (float, default 1).

use tessera_core::error::CommitError;
use tessera_core::kernel::LightDesc;
use tessera_core::math::Vec3;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};
use tessera_core::param::ParamReader;

fn color_and_intensity(params: &ParamReader<'_>) -> Result<(Vec3, f32), CommitError> {
    Ok((
        params.vec3_or("color", Vec3::ONE)?,
        params.float_or("intensity", 1.0)?,
    ))
}

fn compile_light(scope: &CompileScope<'_>, desc: LightDesc) -> Result<CompiledForm, CommitError> {
    let handle = scope
        .kernel()
        .compile_light(&desc)
        .map_err(|e| scope.kernel_error(e))?;
    Ok(CompiledForm::new(handle))
}

/// Uniform ambient light.
#[derive(Debug, Default)]
pub struct AmbientLight;

impl ObjectKind for AmbientLight {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Light
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let (color, intensity) = color_and_intensity(&scope.params())?;
        compile_light(scope, LightDesc::Ambient { color, intensity })
    }
}

/// Directional light; `direction` (vec3f) is the direction light travels.
#[derive(Debug, Default)]
pub struct DistantLight;

impl ObjectKind for DistantLight {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Light
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let (color, intensity) = color_and_intensity(&params)?;
        let direction = params.vec3_or("direction", Vec3::new(0.0, 0.0, 1.0))?;
        if direction.length_squared() == 0.0 {
            return Err(params.invalid("direction", "non-zero vec3f", "zero vector"));
        }
        compile_light(
            scope,
            LightDesc::Distant {
                direction: direction.normalize(),
                color,
                intensity,
            },
        )
    }
}

/// Point light at `position` (vec3f).
#[derive(Debug, Default)]
pub struct PointLight;

impl ObjectKind for PointLight {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Light
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let (color, intensity) = color_and_intensity(&params)?;
        let position = params.vec3_or("position", Vec3::ZERO)?;
        compile_light(
            scope,
            LightDesc::Point {
                position,
                color,
                intensity,
            },
        )
    }
}
