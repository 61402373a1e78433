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


//! Camera kinds.

use tessera_core::error::CommitError;
use tessera_core::kernel::CameraDesc;
use tessera_core::math::Vec3;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};
use tessera_core::param::ParamReader;

struct Frame {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    aspect: f32,
}

fn read_frame(params: &ParamReader<'_>) -> Result<Frame, CommitError> {
    let position = params.vec3_or("position", Vec3::ZERO)?;
    let direction = params.vec3_or("direction", Vec3::NEG_Z)?;
    let up = params.vec3_or("up", Vec3::Y)?;
    let aspect = params.float_or("aspect", 1.0)?;
    if direction.cross(up).length_squared() == 0.0 {
        return Err(params.invalid(
            "up",
            "a vector not parallel to direction",
            "a parallel or zero vector",
        ));
    }
    if aspect <= 0.0 {
        return Err(params.invalid("aspect", "positive float", &aspect.to_string()));
    }
    Ok(Frame {
        position,
        direction: direction.normalize(),
        up: up.normalize(),
        aspect,
    })
}

fn compile_camera(scope: &CompileScope<'_>, desc: CameraDesc) -> Result<CompiledForm, CommitError> {
    let handle = scope
        .kernel()
        .compile_camera(&desc)
        .map_err(|e| scope.kernel_error(e))?;
    Ok(CompiledForm::new(handle))
}

/// Pinhole camera: `position`, `direction`, `up` (vec3f), `fovy` in degrees
/// and `aspect` (float).
#[derive(Debug, Default)]
pub struct PerspectiveCamera;

impl ObjectKind for PerspectiveCamera {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Camera
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let frame = read_frame(&params)?;
        let fovy = params.float_or("fovy", 60.0)?;
        if !(fovy > 0.0 && fovy < 180.0) {
            return Err(params.invalid("fovy", "degrees in (0, 180)", &fovy.to_string()));
        }
        compile_camera(
            scope,
            CameraDesc::Perspective {
                position: frame.position,
                direction: frame.direction,
                up: frame.up,
                fovy,
                aspect: frame.aspect,
            },
        )
    }
}

/// Parallel camera: same frame parameters as the perspective camera, plus
/// `height`, the image plane height in world units.
#[derive(Debug, Default)]
pub struct OrthographicCamera;

impl ObjectKind for OrthographicCamera {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Camera
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let frame = read_frame(&params)?;
        let height = params.float_or("height", 1.0)?;
        if height <= 0.0 {
            return Err(params.invalid("height", "positive float", &height.to_string()));
        }
        compile_camera(
            scope,
            CameraDesc::Orthographic {
                position: frame.position,
                direction: frame.direction,
                up: frame.up,
                height,
                aspect: frame.aspect,
            },
        )
    }
}
