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


//! The OBJ material.

use tessera_core::error::CommitError;
use tessera_core::kernel::MaterialDesc;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind};

/// Wavefront-style material: `Kd`, `Ks` (vec3f), `Ns` and `d` (float).
#[derive(Debug, Default)]
pub struct ObjMaterial;

impl ObjectKind for ObjMaterial {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Material
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        let params = scope.params();
        let defaults = MaterialDesc::default();
        let d = params.float_or("d", defaults.d)?;
        if !(0.0..=1.0).contains(&d) {
            return Err(params.invalid("d", "opacity in [0, 1]", &d.to_string()));
        }
        let desc = MaterialDesc {
            kd: params.vec3_or("Kd", defaults.kd)?,
            ks: params.vec3_or("Ks", defaults.ks)?,
            ns: params.float_or("Ns", defaults.ns)?,
            d,
        };
        let handle = scope
            .kernel()
            .compile_material(&desc)
            .map_err(|e| scope.kernel_error(e))?;
        Ok(CompiledForm::new(handle))
    }
}
