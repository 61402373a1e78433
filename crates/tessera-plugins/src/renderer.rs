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


//! Renderer kinds.
//!
//! Both families compile the same settings: `spp` (int, default 1, clamped to
//! at least 1), `bgColor` (vec3f/vec4f, default opaque black) and `lights`
//! (object list). They differ in which materials and lights they create.

use tessera_core::error::CommitError;
use tessera_core::kernel::RendererDesc;
use tessera_core::math::LinearRgba;
use tessera_core::object::{CompileScope, CompiledForm, ObjectCategory, ObjectKind, RendererKind};

fn compile_renderer(
    scope: &mut CompileScope<'_>,
    family: &'static str,
) -> Result<CompiledForm, CommitError> {
    let params = scope.params();
    let spp = params.int_or("spp", 1)?.max(1) as u32;
    let background = params.color_or("bgColor", LinearRgba::BLACK)?;
    let lights = scope
        .dependency_list("lights")?
        .iter()
        .map(|light| light.handle().clone())
        .collect();

    let desc = RendererDesc {
        family,
        spp,
        background,
        lights,
    };
    let handle = scope
        .kernel()
        .compile_renderer(&desc)
        .map_err(|e| scope.kernel_error(e))?;
    Ok(CompiledForm::new(handle))
}

/// The scientific-visualization ray caster (`scivis`, `raycast`, `mpi_raycast`).
#[derive(Debug, Default)]
pub struct SciVisRenderer;

impl ObjectKind for SciVisRenderer {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Renderer
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        compile_renderer(scope, self.family())
    }

    fn as_renderer(&self) -> Option<&dyn RendererKind> {
        Some(self)
    }
}

impl RendererKind for SciVisRenderer {
    fn family(&self) -> &'static str {
        "scivis"
    }

    fn resolve_material(&self, requested: &str) -> Option<String> {
        match requested {
            "OBJMaterial" | "obj" => Some("OBJMaterial".to_string()),
            _ => None,
        }
    }

    fn resolve_light(&self, requested: &str) -> Option<String> {
        match requested {
            "ambient" | "distant" => Some(requested.to_string()),
            "point" | "PointLight" => Some("point".to_string()),
            _ => None,
        }
    }
}

/// The OBJ renderer (`obj`, `OBJ`).
///
/// Every material request yields an `OBJMaterial`; only `PointLight` lights
/// are supported.
#[derive(Debug, Default)]
pub struct ObjRenderer;

impl ObjectKind for ObjRenderer {
    fn category(&self) -> ObjectCategory {
        ObjectCategory::Renderer
    }

    fn compile(&self, scope: &mut CompileScope<'_>) -> Result<CompiledForm, CommitError> {
        compile_renderer(scope, self.family())
    }

    fn as_renderer(&self) -> Option<&dyn RendererKind> {
        Some(self)
    }
}

impl RendererKind for ObjRenderer {
    fn family(&self) -> &'static str {
        "obj"
    }

    fn resolve_material(&self, _requested: &str) -> Option<String> {
        Some("OBJMaterial".to_string())
    }

    fn resolve_light(&self, requested: &str) -> Option<String> {
        (requested == "PointLight").then(|| requested.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obj_family_resolution() {
        let obj = ObjRenderer;
        assert_eq!(obj.resolve_material("anything").as_deref(), Some("OBJMaterial"));
        assert_eq!(obj.resolve_light("PointLight").as_deref(), Some("PointLight"));
        assert_eq!(obj.resolve_light("ambient"), None);
    }

    #[test]
    fn test_scivis_family_resolution() {
        let scivis = SciVisRenderer;
        assert_eq!(scivis.resolve_material("obj").as_deref(), Some("OBJMaterial"));
        assert_eq!(scivis.resolve_material("principled"), None);
        assert_eq!(scivis.resolve_light("PointLight").as_deref(), Some("point"));
        assert_eq!(scivis.resolve_light("distant").as_deref(), Some("distant"));
        assert_eq!(scivis.resolve_light("spot"), None);
    }
}
