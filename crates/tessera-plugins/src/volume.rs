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


//! Volume kinds. Commit marshals the field to the kernel, which compiles it
//! and reports its bounding box.

use std::sync::Arc;
use tessera_core::error::CommitError;
use tessera_core::kernel::{KernelObject, VolumeDesc};
use tessera_core::math::Vec3;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};

fn compile_volume(scope: &CompileScope<'_>, desc: VolumeDesc) -> Result<CompiledForm, CommitError> {
    let KernelObject { handle, bounds } = scope
        .kernel()
        .compile_volume(&desc)
        .map_err(|e| scope.kernel_error(e))?;
    Ok(CompiledForm::new(handle).with_bounds(bounds))
}

/// Scalars on a regular grid: `dimensions` (vec3i, required), `gridOrigin`
/// (vec3f, default 0), `gridSpacing` (vec3f, default 1) and `data` (float
/// data, required, one value per grid point).
#[derive(Debug, Default)]
pub struct StructuredRegular;

impl ObjectKind for StructuredRegular {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Volume
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let dimensions = params.require_vec3i("dimensions")?;
        if dimensions.x < 1 || dimensions.y < 1 || dimensions.z < 1 {
            return Err(params.invalid(
                "dimensions",
                "at least one sample per axis",
                &format!("{dimensions:?}"),
            ));
        }
        let origin = params.vec3_or("gridOrigin", Vec3::ZERO)?;
        let spacing = params.vec3_or("gridSpacing", Vec3::ONE)?;

        let data = params.require_data("data")?;
        let values = data
            .read_all::<f32>(0)
            .ok_or_else(|| params.invalid("data", "float data", "elements narrower than a float"))?;
        let expected = dimensions.product();
        if values.len() as i64 != expected {
            return Err(params.invalid(
                "data",
                &format!("{expected} values"),
                &format!("{} values", values.len()),
            ));
        }

        compile_volume(
            scope,
            VolumeDesc::StructuredRegular {
                dimensions,
                origin,
                spacing,
                values: values.into(),
            },
        )
    }
}

/// Scalars on tetrahedral cells: `vertex.position` (vec3f data, required),
/// `index` (four `u32` per cell, required) and `vertex.value` (float data,
/// optional, one value per vertex).
#[derive(Debug, Default)]
pub struct Unstructured;

impl ObjectKind for Unstructured {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Volume
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let positions = params
            .require_data("vertex.position")?
            .read_all::<Vec3>(0)
            .ok_or_else(|| params.invalid("vertex.position", "vec3f data", "narrower elements"))?;
        let cells = params
            .require_data("index")?
            .read_all::<[u32; 4]>(0)
            .ok_or_else(|| params.invalid("index", "four indices per cell", "narrower elements"))?;
        let values = match params.data("vertex.value")? {
            Some(data) => data
                .read_all::<f32>(0)
                .ok_or_else(|| params.invalid("vertex.value", "float data", "narrower elements"))?,
            None => Vec::new(),
        };
        if !values.is_empty() && values.len() != positions.len() {
            return Err(params.invalid(
                "vertex.value",
                &format!("{} values", positions.len()),
                &format!("{} values", values.len()),
            ));
        }

        compile_volume(
            scope,
            VolumeDesc::Unstructured {
                positions: positions.into(),
                cells: Arc::from(cells),
                values: values.into(),
            },
        )
    }
}
